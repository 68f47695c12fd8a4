//! Error types for PromptLab Core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Invalid variable: {0}")]
    InvalidVariable(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
