//! Error types for the engine layer

use thiserror::Error;

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in the engine layer
///
/// Store failures are the only class callers should treat as hard failures;
/// generation and classification always produce some output instead of
/// erroring.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Store failure, propagated untouched
    #[error("Store error: {0}")]
    Store(#[from] promptlab_store::StoreError),

    /// Core type validation failure
    #[error("Core error: {0}")]
    Core(#[from] promptlab_core::CoreError),

    /// A configured classifier pattern failed to compile
    #[error("Invalid classifier pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    /// Outbound model call failure, reported by the transport layer
    #[error("Model call failed: {0}")]
    ModelCall(String),
}
