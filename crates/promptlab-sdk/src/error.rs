//! Error types for the SDK layer

use thiserror::Error;

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;

/// Errors surfaced by the SDK facade
#[derive(Error, Debug)]
pub enum SdkError {
    /// Engine failure (reconciliation, classification setup)
    #[error("Engine error: {0}")]
    Engine(#[from] promptlab_engine::EngineError),

    /// Store failure, the one hard-failure class
    #[error("Store error: {0}")]
    Store(#[from] promptlab_store::StoreError),

    /// Core validation failure
    #[error("Core error: {0}")]
    Core(#[from] promptlab_core::CoreError),

    /// Malformed JSON in an import/export payload
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid builder configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation rejected by an invariant (e.g. deleting a variable in use)
    #[error("Validation error: {0}")]
    Validation(String),
}
