//! FILENAME: app/src/error.rs
// PURPOSE: Host-level error type. Commands flatten it to String at the boundary.

use records::RecordsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("failed to load dataset: {0}")]
    Records(#[from] RecordsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unknown measure: {0}")]
    UnknownMeasure(String),

    #[error("no {0} dataset loaded")]
    NotLoaded(&'static str),

    #[error("state lock poisoned: {0}")]
    LockPoisoned(&'static str),

    #[error("logger already installed")]
    LoggerInstalled,
}

impl From<AppError> for String {
    fn from(err: AppError) -> Self {
        err.to_string()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
