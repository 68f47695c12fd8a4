//! PromptLab Engine - variable reconciliation, prompt generation and
//! response classification
//!
//! The engine sits between the store layer and the SDK facade:
//!
//! - [`Reconciler`]: keeps the shared variable registry consistent with the
//!   current set of templates (scope classification)
//! - [`PromptGenerator`]: turns one template plus its resolved values into a
//!   batch of distinct concrete prompts
//! - [`ResponseClassifier`]: heuristic vulnerable/safe verdict over a model
//!   response
//! - [`ModelClient`]: boundary trait for the outbound model call, with a
//!   mock implementation for tests

pub mod classifier;
pub mod client;
pub mod encoding;
pub mod error;
pub mod generator;
pub mod reconcile;

pub use classifier::{ClassifierConfig, ResponseClassifier, Verdict};
pub use client::{MockModelClient, ModelClient, ModelRequest, ModelResponse};
pub use encoding::EncodingMethod;
pub use error::{EngineError, EngineResult};
pub use generator::{GeneratorOptions, PromptGenerator, RegistryView};
pub use reconcile::{ReconcileReport, Reconciler};
