use csv::StringRecord;
use duckdb::types::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
}

impl ColumnType {
    pub fn sql(&self) -> &'static str {
        match self {
            ColumnType::Integer => "BIGINT",
            ColumnType::Text => "TEXT",
        }
    }

    /// Convert one CSV cell into a value that can be bound to a statement.
    /// Empty integer cells become NULL.
    pub fn bind(&self, cell: &str) -> Result<Value, String> {
        match self {
            ColumnType::Text => Ok(Value::Text(cell.to_string())),
            ColumnType::Integer => {
                let cell = cell.trim();
                if cell.is_empty() {
                    return Ok(Value::Null);
                }
                cell.parse::<i64>()
                    .map(Value::BigInt)
                    .map_err(|_| format!("'{}' is not an integer", cell))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
}

impl Column {
    pub fn new(name: &str, kind: ColumnType) -> Column {
        Column {
            name: name.to_string(),
            kind,
        }
    }

    pub fn text(name: &str) -> Column {
        Column::new(name, ColumnType::Text)
    }
}

/// How the table layout for a CSV file is decided.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaStrategy {
    /// Column names are read from row `header_row` of the file, every column
    /// is TEXT.  Rows above the header are banner lines and get skipped.
    HeaderDerived { header_row: usize },
    /// A vendor-declared column list.  Row 0 of the file is the vendor's own
    /// header and is skipped.
    Fixed(Vec<Column>),
}

impl SchemaStrategy {
    /// Index of the first row that is inserted.
    pub fn first_data_row(&self) -> usize {
        match self {
            SchemaStrategy::HeaderDerived { header_row } => header_row + 1,
            SchemaStrategy::Fixed(_) => 1,
        }
    }

    /// Fewer rows than this and the file is considered empty.
    pub fn min_rows(&self) -> usize {
        match self {
            SchemaStrategy::HeaderDerived { header_row } => header_row + 1,
            SchemaStrategy::Fixed(_) => 2,
        }
    }

    /// Resolve the columns of the table.  Assumes `records` has at least
    /// `min_rows()` rows.
    pub fn columns(&self, records: &[StringRecord]) -> Vec<Column> {
        match self {
            SchemaStrategy::HeaderDerived { header_row } => records[*header_row]
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    if name.trim().is_empty() {
                        Column::text(&format!("column{:02}", i))
                    } else {
                        Column::text(name)
                    }
                })
                .collect(),
            SchemaStrategy::Fixed(columns) => columns.clone(),
        }
    }
}

/// Quote a table or column name for DuckDB.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn create_table_sql(table: &str, columns: &[Column]) -> String {
    let defs: Vec<String> = columns
        .iter()
        .map(|c| format!("{} {}", quote_identifier(&c.name), c.kind.sql()))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({});",
        quote_identifier(table),
        defs.join(", ")
    )
}

pub fn insert_sql(table: &str, columns: &[Column]) -> String {
    let names: Vec<String> = columns.iter().map(|c| quote_identifier(&c.name)).collect();
    let placeholders = vec!["?"; columns.len()];
    format!(
        "INSERT INTO {} ({}) VALUES ({});",
        quote_identifier(table),
        names.join(", "),
        placeholders.join(", ")
    )
}
