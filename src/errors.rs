use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The vendor API answered, but not with what we expected.
    #[error("remote API error: {0}")]
    RemoteApi(String),

    /// Network failure or a non-2xx status.
    #[error("transport error for {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("archive format error in {path}: {reason}")]
    ArchiveFormat { path: String, reason: String },

    #[error("{path} has {found} rows, at least {required} are required")]
    EmptyInput {
        path: String,
        found: usize,
        required: usize,
    },

    /// `line` is the 1-based line of the CSV row that failed.
    #[error("failed to insert line {line} into {table}: {reason}")]
    Insertion {
        table: String,
        line: usize,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Database(#[from] duckdb::Error),
}

impl Error {
    pub fn transport(url: &str, reason: impl ToString) -> Self {
        Error::Transport {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn archive_format(path: &Path, reason: impl ToString) -> Self {
        Error::ArchiveFormat {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
