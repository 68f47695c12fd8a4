//! Builder pattern for PromptLab

use crate::error::{Result, SdkError};
use crate::lab::PromptLab;
use promptlab_engine::{ClassifierConfig, ResponseClassifier};
use promptlab_store::{FileSystemStore, MemoryStore, TemplateStore, VariableStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Builder for PromptLab
///
/// # Example
///
/// ```rust,ignore
/// use promptlab_sdk::PromptLabBuilder;
///
/// // In-memory stores (default, good for tests)
/// let lab = PromptLabBuilder::new().build()?;
///
/// // YAML files on disk
/// let lab = PromptLabBuilder::new()
///     .with_data_dir("data")
///     .build()?;
///
/// // Custom store implementations
/// let lab = PromptLabBuilder::new()
///     .with_template_store(my_templates)
///     .with_variable_store(my_variables)
///     .build()?;
/// ```
pub struct PromptLabBuilder {
    data_dir: Option<PathBuf>,
    template_store: Option<Arc<dyn TemplateStore>>,
    variable_store: Option<Arc<dyn VariableStore>>,
    classifier_config: Option<ClassifierConfig>,
}

impl PromptLabBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            data_dir: None,
            template_store: None,
            variable_store: None,
            classifier_config: None,
        }
    }

    /// Persist templates and variables as YAML files under the given
    /// directory
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Use a custom template store
    pub fn with_template_store(mut self, store: Arc<dyn TemplateStore>) -> Self {
        self.template_store = Some(store);
        self
    }

    /// Use a custom variable store
    pub fn with_variable_store(mut self, store: Arc<dyn VariableStore>) -> Self {
        self.variable_store = Some(store);
        self
    }

    /// Override the refusal patterns and length heuristic used for
    /// response classification
    pub fn with_classifier_config(mut self, config: ClassifierConfig) -> Self {
        self.classifier_config = Some(config);
        self
    }

    /// Build the lab
    ///
    /// Explicit stores take precedence over `with_data_dir`; with neither,
    /// both stores are in-memory.
    pub fn build(self) -> Result<PromptLab> {
        let (templates, variables) = match (self.template_store, self.variable_store) {
            (Some(t), Some(v)) => (t, v),
            (explicit_t, explicit_v) => {
                let (default_t, default_v): (Arc<dyn TemplateStore>, Arc<dyn VariableStore>) =
                    match &self.data_dir {
                        Some(dir) => {
                            let store = Arc::new(FileSystemStore::new(dir).map_err(|e| {
                                SdkError::Config(format!(
                                    "failed to open data dir {}: {e}",
                                    dir.display()
                                ))
                            })?);
                            (store.clone(), store)
                        }
                        None => {
                            let store = Arc::new(MemoryStore::new());
                            (store.clone(), store)
                        }
                    };
                (
                    explicit_t.unwrap_or(default_t),
                    explicit_v.unwrap_or(default_v),
                )
            }
        };

        let classifier = match self.classifier_config {
            Some(config) => ResponseClassifier::new(config)?,
            None => ResponseClassifier::with_defaults(),
        };

        Ok(PromptLab::new(templates, variables, classifier))
    }
}

impl Default for PromptLabBuilder {
    fn default() -> Self {
        Self::new()
    }
}
