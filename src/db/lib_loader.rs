use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use duckdb::{params_from_iter, Connection};
use log::info;

use crate::db::schema::{create_table_sql, insert_sql, SchemaStrategy};
use crate::errors::{Error, Result};

/// Read all the rows of a CSV document.  Rows may have different lengths,
/// the header is not treated specially.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<StringRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let records = rdr.records().collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Load a CSV file into `table`, creating the table if needed.  Rows are
/// appended, so loading the same file twice duplicates them.
/// Return the number of rows inserted.
pub fn load(
    csv_path: &Path,
    table: &str,
    strategy: &SchemaStrategy,
    conn: &Connection,
) -> Result<usize> {
    let records = read_records(File::open(csv_path)?)?;
    load_records(&csv_path.display().to_string(), &records, table, strategy, conn)
}

/// 1-based line where the record starts in the file.  Records built in
/// memory have no position, fall back to the record index.
fn csv_line(record: &StringRecord, idx: usize) -> usize {
    record
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or(idx + 1)
}

/// Insert already parsed rows.  `source` is only used for error messages.
///
/// Every insert commits on its own.  If a row fails, the rows before it
/// stay in the table.
pub fn load_records(
    source: &str,
    records: &[StringRecord],
    table: &str,
    strategy: &SchemaStrategy,
    conn: &Connection,
) -> Result<usize> {
    if records.len() < strategy.min_rows() {
        return Err(Error::EmptyInput {
            path: source.to_string(),
            found: records.len(),
            required: strategy.min_rows(),
        });
    }

    let columns = strategy.columns(records);
    let header = &records[strategy.first_data_row() - 1];
    let schema_error = |e: duckdb::Error| Error::Insertion {
        table: table.to_string(),
        line: csv_line(header, strategy.first_data_row() - 1),
        reason: e.to_string(),
    };
    conn.execute_batch(&create_table_sql(table, &columns))
        .map_err(schema_error)?;

    let mut stmt = conn
        .prepare(&insert_sql(table, &columns))
        .map_err(schema_error)?;
    let mut count = 0;
    for (idx, record) in records.iter().enumerate().skip(strategy.first_data_row()) {
        let insertion_error = |reason: String| Error::Insertion {
            table: table.to_string(),
            line: csv_line(record, idx),
            reason,
        };
        if record.len() != columns.len() {
            return Err(insertion_error(format!(
                "row has {} fields, table has {} columns",
                record.len(),
                columns.len()
            )));
        }
        let values = columns
            .iter()
            .zip(record.iter())
            .map(|(column, cell)| {
                column
                    .kind
                    .bind(cell)
                    .map_err(|e| format!("column {}: {}", column.name, e))
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(insertion_error)?;
        stmt.execute(params_from_iter(values.iter()))
            .map_err(|e| insertion_error(e.to_string()))?;
        count += 1;
    }

    info!("inserted {} rows from {} into {}", count, source, table);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::result::Result;
    use std::fs;

    use super::*;
    use crate::db::schema::{Column, ColumnType};

    fn count_rows(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT count(*) FROM \"{}\"", table), [], |row| {
            row.get(0)
        })
        .unwrap()
    }

    fn table_exists(conn: &Connection, table: &str) -> bool {
        let n: i64 = conn
            .query_row(
                "SELECT count(*) FROM information_schema.tables WHERE table_name = ?",
                duckdb::params![table],
                |row| row.get(0),
            )
            .unwrap();
        n == 1
    }

    fn header_row_zero() -> SchemaStrategy {
        SchemaStrategy::HeaderDerived { header_row: 0 }
    }

    #[test]
    fn load_file_with_header_in_first_row() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("auctions.csv");
        fs::write(&path, "id,name\n1,foo\n2,bar\n")?;

        let conn = Connection::open_in_memory()?;
        let n = load(&path, "domains", &header_row_zero(), &conn)?;
        assert_eq!(n, 2);

        let mut stmt = conn.prepare(
            "SELECT column_name, data_type FROM information_schema.columns \
             WHERE table_name = 'domains' ORDER BY ordinal_position",
        )?;
        let columns: Vec<(String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<_, _>>()?;
        assert_eq!(
            columns,
            vec![
                ("id".to_string(), "VARCHAR".to_string()),
                ("name".to_string(), "VARCHAR".to_string())
            ]
        );

        let mut stmt = conn.prepare("SELECT id, name FROM domains ORDER BY id")?;
        let rows: Vec<(String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<_, _>>()?;
        assert_eq!(
            rows,
            vec![
                ("1".to_string(), "foo".to_string()),
                ("2".to_string(), "bar".to_string())
            ]
        );
        Ok(())
    }

    #[test]
    fn load_with_banner_row() -> Result<(), Box<dyn Error>> {
        let data = "DropCatch auctions 08/01/2024\n\
                    Domain,Bids,Price\n\
                    example.com,3,120\n\
                    sample.net,0,5\n\
                    test.org,12,990\n";
        let records = read_records(data.as_bytes())?;
        let conn = Connection::open_in_memory()?;
        let n = load_records(
            "memory",
            &records,
            "domains",
            &SchemaStrategy::HeaderDerived { header_row: 1 },
            &conn,
        )?;
        assert_eq!(n, 3);
        assert_eq!(count_rows(&conn, "domains"), 3);
        let price: String = conn.query_row(
            "SELECT Price FROM domains WHERE Domain = 'test.org'",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(price, "990");
        Ok(())
    }

    #[test]
    fn header_only_file_creates_empty_table() -> Result<(), Box<dyn Error>> {
        let records = read_records("id,name\n".as_bytes())?;
        let conn = Connection::open_in_memory()?;
        let n = load_records("memory", &records, "domains", &header_row_zero(), &conn)?;
        assert_eq!(n, 0);
        assert!(table_exists(&conn, "domains"));
        Ok(())
    }

    #[test]
    fn too_few_rows_is_empty_input() -> Result<(), Box<dyn Error>> {
        let conn = Connection::open_in_memory()?;

        let records = read_records("".as_bytes())?;
        let res = load_records("empty.csv", &records, "domains", &header_row_zero(), &conn);
        assert!(matches!(
            res,
            Err(crate::errors::Error::EmptyInput {
                found: 0,
                required: 1,
                ..
            })
        ));

        let records = read_records("banner only\n".as_bytes())?;
        let strategy = SchemaStrategy::HeaderDerived { header_row: 1 };
        let res = load_records("banner.csv", &records, "domains", &strategy, &conn);
        assert!(matches!(
            res,
            Err(crate::errors::Error::EmptyInput { required: 2, .. })
        ));

        assert!(!table_exists(&conn, "domains"));
        Ok(())
    }

    #[test]
    fn short_row_aborts_and_keeps_earlier_rows() -> Result<(), Box<dyn Error>> {
        let records = read_records("a,b\n1,2\n3\n4,5\n".as_bytes())?;
        let conn = Connection::open_in_memory()?;
        let res = load_records("memory", &records, "domains", &header_row_zero(), &conn);
        match res {
            Err(crate::errors::Error::Insertion { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected an insertion error, got {:?}", other),
        }
        assert_eq!(count_rows(&conn, "domains"), 1);
        Ok(())
    }

    #[test]
    fn loading_twice_appends() -> Result<(), Box<dyn Error>> {
        let records = read_records("id,name\n1,foo\n2,bar\n".as_bytes())?;
        let conn = Connection::open_in_memory()?;
        load_records("memory", &records, "domains", &header_row_zero(), &conn)?;
        load_records("memory", &records, "domains", &header_row_zero(), &conn)?;
        assert_eq!(count_rows(&conn, "domains"), 4);
        Ok(())
    }

    #[test]
    fn fixed_schema_binds_typed_values() -> Result<(), Box<dyn Error>> {
        let strategy = SchemaStrategy::Fixed(vec![
            Column::new("item_id", ColumnType::Integer),
            Column::text("domain_name"),
            Column::new("bids", ColumnType::Integer),
        ]);
        let records = read_records("Item,Domain,Bids\n101,example.com,4\n102,sample.net,\n".as_bytes())?;
        let conn = Connection::open_in_memory()?;
        assert_eq!(load_records("memory", &records, "godaddy", &strategy, &conn)?, 2);

        let (bids, total): (Option<i64>, i64) = conn.query_row(
            "SELECT (SELECT bids FROM godaddy WHERE item_id = 102), sum(item_id)::BIGINT FROM godaddy",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        assert_eq!(bids, None);
        assert_eq!(total, 203);

        let records = read_records("Item,Domain,Bids\nabc,example.com,4\n".as_bytes())?;
        let res = load_records("memory", &records, "godaddy", &strategy, &conn);
        assert!(matches!(
            res,
            Err(crate::errors::Error::Insertion { line: 2, .. })
        ));
        Ok(())
    }

    #[test]
    fn values_are_not_interpolated() -> Result<(), Box<dyn Error>> {
        let records =
            read_records("name\n\"x'); DROP TABLE domains; --\"\n".as_bytes())?;
        let conn = Connection::open_in_memory()?;
        load_records("memory", &records, "domains", &header_row_zero(), &conn)?;
        let name: String = conn.query_row("SELECT name FROM domains", [], |row| row.get(0))?;
        assert_eq!(name, "x'); DROP TABLE domains; --");
        Ok(())
    }

    #[test]
    fn different_header_on_second_load() -> Result<(), Box<dyn Error>> {
        let conn = Connection::open_in_memory()?;
        let first = read_records("id,name\n1,foo\n".as_bytes())?;
        load_records("first.csv", &first, "domains", &header_row_zero(), &conn)?;

        let second = read_records("id,title\n2,bar\n".as_bytes())?;
        let res = load_records("second.csv", &second, "domains", &header_row_zero(), &conn);
        assert!(matches!(
            res,
            Err(crate::errors::Error::Insertion { line: 1, .. })
        ));
        assert_eq!(count_rows(&conn, "domains"), 1);
        Ok(())
    }

    #[test]
    fn duplicate_header_names() -> Result<(), Box<dyn Error>> {
        let conn = Connection::open_in_memory()?;
        let records = read_records("banner\nid,id\n1,2\n".as_bytes())?;
        let strategy = SchemaStrategy::HeaderDerived { header_row: 1 };
        let res = load_records("dups.csv", &records, "domains", &strategy, &conn);
        assert!(matches!(
            res,
            Err(crate::errors::Error::Insertion { line: 2, .. })
        ));
        Ok(())
    }

    #[test]
    fn error_line_counts_multiline_fields() -> Result<(), Box<dyn Error>> {
        let records = read_records("a,b\n\"first\nsecond\",2\n3\n".as_bytes())?;
        let conn = Connection::open_in_memory()?;
        let res = load_records("memory", &records, "domains", &header_row_zero(), &conn);
        match res {
            Err(crate::errors::Error::Insertion { line, .. }) => assert_eq!(line, 4),
            other => panic!("expected an insertion error, got {:?}", other),
        }
        assert_eq!(count_rows(&conn, "domains"), 1);
        Ok(())
    }

    #[test]
    fn fixed_schema_keeps_64_bit_integers() -> Result<(), Box<dyn Error>> {
        let strategy = SchemaStrategy::Fixed(vec![
            Column::new("item_id", ColumnType::Integer),
            Column::text("domain_name"),
        ]);
        let records = read_records("Item,Domain\n3000000000,example.com\n".as_bytes())?;
        let conn = Connection::open_in_memory()?;
        assert_eq!(load_records("memory", &records, "godaddy", &strategy, &conn)?, 1);
        let item_id: i64 = conn.query_row("SELECT item_id FROM godaddy", [], |row| row.get(0))?;
        assert_eq!(item_id, 3_000_000_000);
        Ok(())
    }

    #[test]
    fn fixed_schema_header_only_is_empty_input() -> Result<(), Box<dyn Error>> {
        let strategy = SchemaStrategy::Fixed(vec![
            Column::new("item_id", ColumnType::Integer),
            Column::text("domain_name"),
        ]);
        let records = read_records("Item,Domain\n".as_bytes())?;
        let conn = Connection::open_in_memory()?;
        let res = load_records("godaddy.csv", &records, "godaddy", &strategy, &conn);
        assert!(matches!(
            res,
            Err(crate::errors::Error::EmptyInput {
                found: 1,
                required: 2,
                ..
            })
        ));
        assert!(!table_exists(&conn, "godaddy"));
        Ok(())
    }
}
