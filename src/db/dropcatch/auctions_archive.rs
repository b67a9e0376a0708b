use std::path::{Path, PathBuf};

use duckdb::Connection;
use log::info;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER};
use serde::Deserialize;

use crate::db::lib_loader;
use crate::db::schema::SchemaStrategy;
use crate::errors::{Error, Result};
use crate::utils::lib_download::download_file;
use crate::utils::lib_zip::{decompress_single_entry, is_zip};

pub const DEFAULT_API_URL: &str =
    "https://client.dropcatch.com/GetFileUrl?FileType=csv&RequestType=Auction&AuctionType=AllAuctions";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileUrlResponse {
    result: FileUrlResult,
    success: bool,
    status_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileUrlResult {
    file_url: String,
    file_name: String,
}

/// Where the current auction export lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub url: String,
    pub file_name: String,
}

/// Parse the JSON envelope returned by the file url endpoint.
pub fn parse_file_url_response(body: &str) -> Result<DownloadTarget> {
    let response: FileUrlResponse = serde_json::from_str(body)
        .map_err(|e| Error::RemoteApi(format!("unexpected response body: {}", e)))?;
    if !response.success || response.status_code != "OK" {
        return Err(Error::RemoteApi(format!(
            "request was not successful, success: {}, statusCode: {}",
            response.success, response.status_code
        )));
    }
    // keep only the last path component, the file is saved in our own dir
    let file_name = Path::new(&response.result.file_name)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    if file_name.is_empty() {
        return Err(Error::RemoteApi(format!(
            "invalid file name '{}'",
            response.result.file_name
        )));
    }
    Ok(DownloadTarget {
        url: response.result.file_url,
        file_name,
    })
}

#[derive(Clone)]
pub struct DropcatchAuctionsArchive {
    pub base_dir: String,
    pub duckdb_path: String,
    pub api_url: String,
    /// Row of the export that holds the column names.  The export starts
    /// with a banner line, so this is 1 in production.
    pub header_row: usize,
}

impl DropcatchAuctionsArchive {
    pub const TABLE: &'static str = "domains";

    /// Path of the downloaded file
    pub fn filename(&self, target: &DownloadTarget) -> PathBuf {
        Path::new(&self.base_dir).join(&target.file_name)
    }

    /// Ask the API where today's export is.
    pub fn get_download_target(&self, client: &Client) -> Result<DownloadTarget> {
        let response = client
            .get(&self.api_url)
            .header(ACCEPT, "application/json, text/plain, */*")
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(ORIGIN, "https://www.dropcatch.com")
            .header(REFERER, "https://www.dropcatch.com/")
            .send()
            .map_err(|e| Error::transport(&self.api_url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::transport(
                &self.api_url,
                format!("bad status: {}", status),
            ));
        }
        let body = response
            .text()
            .map_err(|e| Error::transport(&self.api_url, e))?;
        let target = parse_file_url_response(&body)?;
        info!("export {} is at {}", target.file_name, target.url);
        Ok(target)
    }

    /// Download the export, return the path of the file on disk.
    pub fn download_file(&self, client: &Client, target: &DownloadTarget) -> Result<PathBuf> {
        let path = self.filename(target);
        download_file(client, &target.url, None, &path)?;
        Ok(path)
    }

    /// The export may come zipped.  Return the path of the CSV file.
    pub fn extract_csv(&self, path: &Path) -> Result<PathBuf> {
        if is_zip(path) {
            decompress_single_entry(path)
        } else {
            Ok(path.to_path_buf())
        }
    }

    pub fn schema(&self) -> SchemaStrategy {
        SchemaStrategy::HeaderDerived {
            header_row: self.header_row,
        }
    }

    /// Append the rows of the CSV file to the `domains` table.
    pub fn update_duckdb(&self, conn: &Connection, csv_path: &Path) -> Result<usize> {
        info!("inserting {} into {} ...", csv_path.display(), Self::TABLE);
        lib_loader::load(csv_path, Self::TABLE, &self.schema(), conn)
    }
}
