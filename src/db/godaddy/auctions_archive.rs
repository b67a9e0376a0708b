use std::path::{Path, PathBuf};

use duckdb::Connection;
use jiff::Timestamp;
use log::info;
use reqwest::blocking::Client;
use reqwest::Url;

use crate::db::lib_loader;
use crate::db::schema::{Column, ColumnType, SchemaStrategy};
use crate::errors::{Error, Result};
use crate::utils::lib_download::download_file;

pub const DEFAULT_API_URL: &str =
    "https://auctions.godaddy.com/beta/findApiProxy/v4/aftermarket/find/auction/recommend";

#[derive(Clone)]
pub struct GodaddyAuctionsArchive {
    pub base_dir: String,
    pub duckdb_path: String,
    pub api_url: String,
}

impl GodaddyAuctionsArchive {
    pub const TABLE: &'static str = "godaddy";

    /// Columns of the CSV export, in file order.
    pub fn all_columns() -> Vec<Column> {
        use ColumnType::*;
        vec![
            Column::new("item_id", Integer),
            Column::new("domain_name", Text),
            Column::new("traffic", Integer),
            Column::new("bids", Integer),
            Column::new("price", Integer),
            Column::new("estimated_value", Integer),
            Column::new("domain_age", Integer),
            Column::new("auction_end_time", Text),
            Column::new("sale_type", Text),
            Column::new("majestic_tf", Integer),
            Column::new("majestic_cf", Integer),
            Column::new("backlinks", Integer),
            Column::new("referring_domains", Integer),
        ]
    }

    /// Export of all auctions ending after `end_time_after`.
    pub fn export_url(&self, end_time_after: Timestamp) -> Result<Url> {
        let end_time = format!(
            "{}.{:03}Z",
            end_time_after.strftime("%Y-%m-%dT%H:%M:%S"),
            end_time_after.subsec_millisecond()
        );
        Url::parse_with_params(
            &self.api_url,
            &[("endTimeAfter", end_time.as_str()), ("exportCSV", "true")],
        )
        .map_err(|e| Error::Config(format!("invalid url {}: {}", self.api_url, e)))
    }

    /// Path of the CSV file downloaded at `asof`
    pub fn filename(&self, asof: Timestamp) -> PathBuf {
        Path::new(&self.base_dir).join(format!(
            "godaddy_auctions_{}.csv",
            asof.strftime("%Y%m%dT%H%M%S")
        ))
    }

    /// Download the CSV export of auctions that haven't ended yet.
    pub fn download_file(&self, client: &Client, asof: Timestamp) -> Result<PathBuf> {
        let url = self.export_url(asof)?;
        let path = self.filename(asof);
        info!("downloading {}", url);
        download_file(
            client,
            url.as_str(),
            Some("text/csv, application/json, text/plain, */*"),
            &path,
        )?;
        Ok(path)
    }

    pub fn schema(&self) -> SchemaStrategy {
        SchemaStrategy::Fixed(Self::all_columns())
    }

    /// Append the rows of the CSV file to the `godaddy` table.
    pub fn update_duckdb(&self, conn: &Connection, csv_path: &Path) -> Result<usize> {
        info!("inserting {} into {} ...", csv_path.display(), Self::TABLE);
        lib_loader::load(csv_path, Self::TABLE, &self.schema(), conn)
    }
}
