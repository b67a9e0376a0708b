use std::{env, str::FromStr, time::Duration};

use crate::{
    db::{
        dropcatch::auctions_archive::{self as dropcatch_archive, DropcatchAuctionsArchive},
        godaddy::auctions_archive::{self as godaddy_archive, GodaddyAuctionsArchive},
    },
    errors::{Error, Result},
};

/// Value of an environment variable, or `default` if it isn't set.
fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| Error::Config(format!("{}={} is not valid", key, value))),
        Err(_) => Ok(default),
    }
}

pub struct ProdDb {}

impl ProdDb {
    pub fn download_dir() -> String {
        env_or("DOMAINS_DOWNLOAD_DIR", ".")
    }

    pub fn duckdb_path() -> String {
        env_or("DOMAINS_DUCKDB_PATH", "domains.db")
    }

    pub fn http_timeout() -> Result<Duration> {
        Ok(Duration::from_secs(env_parse("DOMAINS_HTTP_TIMEOUT_SECS", 300)?))
    }

    pub fn dropcatch_auctions() -> Result<DropcatchAuctionsArchive> {
        Ok(DropcatchAuctionsArchive {
            base_dir: Self::download_dir(),
            duckdb_path: Self::duckdb_path(),
            api_url: env_or("DROPCATCH_API_URL", dropcatch_archive::DEFAULT_API_URL),
            header_row: env_parse("DROPCATCH_HEADER_ROW", 1)?,
        })
    }

    pub fn godaddy_auctions() -> Result<GodaddyAuctionsArchive> {
        Ok(GodaddyAuctionsArchive {
            base_dir: Self::download_dir(),
            duckdb_path: Self::duckdb_path(),
            api_url: env_or("GODADDY_API_URL", godaddy_archive::DEFAULT_API_URL),
        })
    }
}
