use std::{
    fs::{self, File},
    path::Path,
    time::Duration,
};

use log::{info, warn};
use reqwest::{
    blocking::Client,
    header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT},
};

use crate::errors::{Error, Result};

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36";

/// A blocking client that looks like a browser to the vendor sites.
pub fn http_client(timeout: Duration) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Config(format!("failed to build http client: {}", e)))
}

/// Download `url` into `file_path`, overwriting an existing file.
/// The status is checked before the file is created, so a failed request
/// leaves nothing behind.  Return the number of bytes written.
pub fn download_file(
    client: &Client,
    url: &str,
    accept_header: Option<&str>,
    file_path: &Path,
) -> Result<u64> {
    let mut builder = client.get(url);
    if let Some(accept_header) = accept_header {
        builder = builder.header(ACCEPT, accept_header);
    }
    let mut response = builder.send().map_err(|e| Error::transport(url, e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::transport(url, format!("bad status: {}", status)));
    }

    if let Some(dir) = file_path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    let mut out = File::create(file_path)?;
    match response.copy_to(&mut out) {
        Ok(n) => {
            info!("downloaded {} bytes to {}", n, file_path.display());
            Ok(n)
        }
        Err(e) => {
            drop(out);
            let _ = fs::remove_file(file_path);
            Err(Error::transport(url, e))
        }
    }
}

/// Remove downloaded artifacts.  Failures are only logged.
pub fn remove_files(paths: &[&Path]) {
    for path in paths {
        match fs::remove_file(path) {
            Ok(_) => info!("removed {}", path.display()),
            Err(e) => warn!("could not remove {}: {}", path.display(), e),
        }
    }
}

/// Remove the downloaded file and the CSV extracted from it.  They are the
/// same file when the download wasn't an archive.
pub fn remove_downloads(downloaded: &Path, csv_path: &Path) {
    if downloaded == csv_path {
        remove_files(&[downloaded]);
    } else {
        remove_files(&[downloaded, csv_path]);
    }
}
