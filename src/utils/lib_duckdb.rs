use std::time::Duration;

use duckdb::{AccessMode, Config};
use log::warn;

/// `AccessMode` is consumed by `Config`, so build a fresh one per attempt.
fn config_for(access_mode: &AccessMode) -> Result<Config, duckdb::Error> {
    let mode = match access_mode {
        AccessMode::Automatic => AccessMode::Automatic,
        AccessMode::ReadOnly => AccessMode::ReadOnly,
        AccessMode::ReadWrite => AccessMode::ReadWrite,
    };
    Config::default().access_mode(mode)
}

/// Use this function to open a DuckDB connection.  Another process may
/// hold the file lock for a moment, so retry with a doubling wait.
/// Suggested `max_attempts = 8`, `initial_wait = Duration::from_millis(25)`.
pub fn open_with_retry(
    duckdb_path: &str,
    max_attempts: u32,
    initial_wait: Duration,
    access_mode: AccessMode,
) -> Result<duckdb::Connection, duckdb::Error> {
    let mut attempts = 0;
    let mut wait_duration = initial_wait;

    loop {
        let config = config_for(&access_mode)?;
        match duckdb::Connection::open_with_flags(duckdb_path, config) {
            Ok(conn) => return Ok(conn),
            Err(e) => {
                attempts += 1;
                if attempts >= max_attempts {
                    return Err(e);
                }
                warn!(
                    "Retrying to open {} after error: {} (attempt {}/{})",
                    duckdb_path, e, attempts, max_attempts
                );
                std::thread::sleep(wait_duration);
                wait_duration *= 2;
            }
        }
    }
}
