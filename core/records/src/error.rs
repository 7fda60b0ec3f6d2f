//! FILENAME: core/records/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

pub type Result<T> = std::result::Result<T, RecordsError>;
