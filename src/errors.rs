use thiserror::Error;
use std::num::ParseIntError;

use crate::models::returns::ClassificationMismatch;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Arrow error: {0}")]
    ArrowError(String),

    #[error("Date parsing error: {0}")]
    DateError(#[from] chrono::ParseError),

    #[error("Parse int error: {0}")]
    ParseIntError(#[from] ParseIntError),

    #[error("No data found for {symbol} between {start} and {end}")]
    DataUnavailable {
        symbol: String,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("Classification mismatch: {0}")]
    ClassificationMismatch(ClassificationMismatch),

    #[error("Rendering error: {0}")]
    RenderError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl StatsError {
    /// Errors that only affect a single instrument or a single report and
    /// must not stop a batch.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StatsError::DataUnavailable { .. }
                | StatsError::RequestError(_)
                | StatsError::DataError(_)
                | StatsError::ClassificationMismatch(_)
                | StatsError::RenderError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StatsError>;

impl From<String> for StatsError {
    fn from(s: String) -> Self {
        StatsError::Unknown(s)
    }
}

impl From<&str> for StatsError {
    fn from(s: &str) -> Self {
        StatsError::Unknown(s.to_string())
    }
}
