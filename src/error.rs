use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] ::config::ConfigError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid coordinate format: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Failure isolated to a single record. The batch carries on without it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("Record {record_id}: invalid field '{field}': {reason}")]
    Validation {
        record_id: String,
        field: String,
        reason: String,
    },

    #[error("Record {record_id}: {message}")]
    Configuration { record_id: String, message: String },
}

impl RecordError {
    pub fn validation(record_id: &str, field: &str, reason: impl Into<String>) -> Self {
        RecordError::Validation {
            record_id: record_id.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn configuration(record_id: &str, message: impl Into<String>) -> Self {
        RecordError::Configuration {
            record_id: record_id.to_string(),
            message: message.into(),
        }
    }

    pub fn record_id(&self) -> &str {
        match self {
            RecordError::Validation { record_id, .. } => record_id,
            RecordError::Configuration { record_id, .. } => record_id,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, RecordError::Validation { .. })
    }
}
