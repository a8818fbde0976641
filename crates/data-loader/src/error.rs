//! Error types for loading a restaurant snapshot.

use thiserror::Error;

/// Everything that can go wrong between the snapshot directory and a `DataIndex`
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// A required snapshot file is missing
    #[error("Required snapshot file missing: {path}")]
    FileNotFound { path: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The file is not a JSON array of the expected record shape
    #[error("Malformed {file}: {reason}")]
    ParseError { file: String, reason: String },

    #[error("Invalid {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Cross-record checks failed (duplicate ids and the like)
    #[error("Snapshot validation failed: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DataLoadError>;
