//! Error types for the roll reconciliation system.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the roll reconciliation system.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required input column is absent.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// None of the supplied source batches could be used.
    #[error("No usable source batch: every batch failed to load")]
    NoUsableBatches,

    /// Trade date could not be parsed.
    #[error("Invalid trade date: {0}")]
    InvalidDate(String),

    /// Source parse error (malformed CSV, bad time-of-day).
    #[error("Parse error: {0}")]
    Parse(String),

    /// Data error (inconsistent records).
    #[error("Data error: {0}")]
    Data(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Output table export error.
    #[error("Export error: {0}")]
    Export(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a missing column error.
    pub fn missing_column(column: impl Into<String>) -> Self {
        Error::MissingColumn(column.into())
    }

    /// Create an invalid date error.
    pub fn invalid_date(msg: impl Into<String>) -> Self {
        Error::InvalidDate(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Create a database error.
    pub fn database(msg: impl Into<String>) -> Self {
        Error::Database(msg.into())
    }

    /// Create an export error.
    pub fn export(msg: impl Into<String>) -> Self {
        Error::Export(msg.into())
    }

    /// Whether a source batch failing with this error can be skipped
    /// while the rest of the run continues.
    pub fn is_batch_local(&self) -> bool {
        matches!(self, Error::Parse(_) | Error::Io(_))
    }
}
