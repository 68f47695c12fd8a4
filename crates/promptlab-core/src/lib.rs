//! PromptLab Core - Core types and definitions for the PromptLab testing engine
//!
//! This crate provides the fundamental types used across the PromptLab workspace:
//! - Template and variable records
//! - Placeholder detection with false-positive suppression
//! - Legacy record migration
//! - Error types

pub mod detect;
pub mod error;
pub mod schema;
pub mod types;

// Re-export commonly used types
pub use detect::{detect, placeholder_positions};
pub use error::CoreError;
pub use types::{
    RiskLevel, SuccessCriteria, Template, TemplateBindings, TestResult, VarScope, Variable,
    VariableOverview,
};
