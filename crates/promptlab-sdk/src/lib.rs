//! PromptLab SDK - High-level API for the prompt template testing engine
//!
//! Wires the stores, the reconciler, the prompt generator and the response
//! classifier into one facade the embedding application (UI, CLI, service)
//! talks to. Template edits persist first and then trigger a reconciliation
//! pass that keeps the shared variable registry consistent.
//!
//! ```no_run
//! use promptlab_core::Template;
//! use promptlab_sdk::PromptLabBuilder;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let lab = PromptLabBuilder::new().build()?;
//!
//! let template = lab
//!     .create_template(Template::new("", "Role probe", "Act as {role} and {action}"))
//!     .await?;
//!
//! let prompts = lab.generate(&template.id, Default::default()).await?;
//! for prompt in prompts {
//!     println!("{prompt}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod error;
pub mod lab;

pub use builder::PromptLabBuilder;
pub use error::{Result, SdkError};
pub use lab::{ExportBundle, PromptLab};

// Re-export the commonly used lower-layer types
pub use promptlab_core::{
    RiskLevel, SuccessCriteria, Template, TestResult, VarScope, Variable, VariableOverview,
};
pub use promptlab_engine::{
    ClassifierConfig, EncodingMethod, GeneratorOptions, MockModelClient, ModelClient,
    ModelRequest, ModelResponse, ReconcileReport, Verdict,
};
