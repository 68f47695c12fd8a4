//! Error types for the store layer

use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// No record with the given identifier
    #[error("Record not found: {id}")]
    NotFound { id: String },

    /// A record with the given identifier already exists
    #[error("Record already exists: {id}")]
    Conflict { id: String },

    /// I/O error from the backing file system
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Record failed validation or migration at load time
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Generic error
    #[error("Store error: {0}")]
    Other(String),
}

impl From<promptlab_core::CoreError> for StoreError {
    fn from(err: promptlab_core::CoreError) -> Self {
        StoreError::InvalidRecord(err.to_string())
    }
}
