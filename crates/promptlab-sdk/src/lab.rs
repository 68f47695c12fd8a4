//! The PromptLab facade
//!
//! Owns the stores and the engine components. Every template edit persists
//! first and then runs a reconciliation pass over the latest stored
//! snapshot; reconciliation is serialized behind a mutex so concurrent edits
//! cannot interleave read-modify-write cycles on the registry.

use chrono::Utc;
use promptlab_core::{Template, TestResult, VarScope, Variable, VariableOverview};
use promptlab_engine::{
    GeneratorOptions, ModelClient, ModelRequest, PromptGenerator, ReconcileReport, Reconciler,
    RegistryView, ResponseClassifier, Verdict,
};
use promptlab_store::{StoreError, TemplateStore, VariableStore};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::error::{Result, SdkError};

/// Portable bundle of all templates and registry variables
///
/// The JSON interchange shape used by [`PromptLab::export_json`] and
/// [`PromptLab::import_json`].
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportBundle {
    pub templates: Vec<Template>,
    pub variables: Vec<Variable>,
}

/// High-level API over templates, the variable registry, generation and
/// classification
pub struct PromptLab {
    templates: Arc<dyn TemplateStore>,
    variables: Arc<dyn VariableStore>,
    reconciler: Reconciler,
    /// Serializes reconciliation passes (single-writer requirement)
    reconcile_gate: Mutex<()>,
    generator: PromptGenerator,
    classifier: ResponseClassifier,
}

impl PromptLab {
    pub(crate) fn new(
        templates: Arc<dyn TemplateStore>,
        variables: Arc<dyn VariableStore>,
        classifier: ResponseClassifier,
    ) -> Self {
        let reconciler = Reconciler::new(templates.clone(), variables.clone());
        Self {
            templates,
            variables,
            reconciler,
            reconcile_gate: Mutex::new(()),
            generator: PromptGenerator::new(),
            classifier,
        }
    }

    // ========== Templates ==========

    /// Create a template and reconcile the registry
    ///
    /// An empty id is replaced with a fresh UUID. Returns the stored
    /// template with its bindings as reconciliation left them.
    pub async fn create_template(&self, mut template: Template) -> Result<Template> {
        if template.id.is_empty() {
            template.id = uuid::Uuid::new_v4().to_string();
        }
        self.templates.create_template(&template).await?;
        tracing::info!(id = %template.id, name = %template.name, "created template");
        self.reconcile().await?;
        Ok(self.templates.get_template(&template.id).await?)
    }

    /// Update a template's content and reconcile the registry
    pub async fn update_template(&self, mut template: Template) -> Result<Template> {
        template.updated_at = Utc::now();
        self.templates.update_template(&template).await?;
        tracing::info!(id = %template.id, "updated template");
        self.reconcile().await?;
        Ok(self.templates.get_template(&template.id).await?)
    }

    /// Delete a template and reconcile the registry
    ///
    /// Variables only this template referenced become orphaned registry
    /// entries; their values are kept.
    pub async fn delete_template(&self, id: &str) -> Result<()> {
        self.templates.delete_template(id).await?;
        tracing::info!(%id, "deleted template");
        self.reconcile().await?;
        Ok(())
    }

    /// Load one template
    pub async fn get_template(&self, id: &str) -> Result<Template> {
        Ok(self.templates.get_template(id).await?)
    }

    /// Load all templates
    pub async fn list_templates(&self) -> Result<Vec<Template>> {
        Ok(self.templates.list_templates().await?)
    }

    /// Set the private values a template supplies for one of its
    /// placeholders
    ///
    /// This is the operator-edit path; reconciliation never overwrites
    /// values entered here. A globally scoped name is rejected: its values
    /// are shared across templates and flow through
    /// [`set_variable_values`](Self::set_variable_values), and a private
    /// binding for it would be unioned into the shared list on the next
    /// reconcile.
    pub async fn set_private_values(
        &self,
        template_id: &str,
        name: &str,
        values: Vec<String>,
    ) -> Result<Template> {
        let mut template = self.templates.get_template(template_id).await?;
        if !template.detected_variables().contains(name) {
            return Err(SdkError::Validation(format!(
                "template {template_id} has no placeholder named {name:?}"
            )));
        }
        if let Some(variable) = self.variables.find_variable(name).await? {
            if variable.scope == VarScope::Global && variable.usage_count() >= 2 {
                return Err(SdkError::Validation(format!(
                    "variable {name:?} is global; its values are shared and edited through the registry"
                )));
            }
        }
        template.bindings.private.insert(name.to_string(), values);
        self.update_template(template).await
    }

    // ========== Variables ==========

    /// Rows for the variable overview screen
    pub async fn variable_overview(&self) -> Result<Vec<VariableOverview>> {
        let variables = self.variables.list_variables().await?;
        Ok(variables
            .into_iter()
            .map(|v| VariableOverview {
                usage_count: v.usage_count(),
                value_count: v.values.len(),
                name: v.name,
                scope: v.scope,
            })
            .collect())
    }

    /// Load one registry variable
    pub async fn get_variable(&self, name: &str) -> Result<Variable> {
        Ok(self.variables.get_variable(name).await?)
    }

    /// Replace the shared values of a registry variable
    ///
    /// Only global (or orphaned) entries can be edited here; a private
    /// variable's values are owned by its single template and flow through
    /// [`set_private_values`](Self::set_private_values).
    pub async fn set_variable_values(&self, name: &str, values: Vec<String>) -> Result<Variable> {
        let mut variable = self.variables.get_variable(name).await?;
        if variable.scope == VarScope::Private && !variable.used_by.is_empty() {
            return Err(SdkError::Validation(format!(
                "variable {name:?} is private; its values are owned by its template"
            )));
        }
        variable.values = values;
        variable.updated_at = Utc::now();
        self.variables.update_variable(&variable).await?;
        Ok(variable)
    }

    /// Delete a registry variable
    ///
    /// Refused while any template still references it.
    pub async fn delete_variable(&self, name: &str) -> Result<()> {
        let variable = self.variables.get_variable(name).await?;
        if !variable.used_by.is_empty() {
            return Err(SdkError::Validation(format!(
                "variable {name:?} is used by {} template(s) and cannot be deleted",
                variable.used_by.len()
            )));
        }
        self.variables.delete_variable(name).await?;
        Ok(())
    }

    // ========== Reconciliation ==========

    /// Run a reconciliation pass over the latest stored snapshot
    ///
    /// Serialized: concurrent callers queue behind the gate, and each pass
    /// re-reads all templates from the store.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let _guard = self.reconcile_gate.lock().await;
        Ok(self.reconciler.reconcile().await?)
    }

    /// Bulk import templates and variables, then reconcile once
    ///
    /// Records are upserted; scope consistency is restored by the final
    /// reconciliation pass.
    pub async fn import(
        &self,
        templates: Vec<Template>,
        variables: Vec<Variable>,
    ) -> Result<ReconcileReport> {
        for variable in &variables {
            if self.variables.find_variable(&variable.name).await?.is_some() {
                self.variables.update_variable(variable).await?;
            } else {
                self.variables.create_variable(variable).await?;
            }
        }
        for template in &templates {
            match self.templates.get_template(&template.id).await {
                Ok(_) => self.templates.update_template(template).await?,
                Err(StoreError::NotFound { .. }) => {
                    self.templates.create_template(template).await?
                }
                Err(e) => return Err(e.into()),
            }
        }
        tracing::info!(
            templates = templates.len(),
            variables = variables.len(),
            "imported records"
        );
        self.reconcile().await
    }

    /// Serialize all templates and variables as a JSON bundle
    pub async fn export_json(&self) -> Result<String> {
        let bundle = ExportBundle {
            templates: self.templates.list_templates().await?,
            variables: self.variables.list_variables().await?,
        };
        Ok(serde_json::to_string_pretty(&bundle)?)
    }

    /// Import a JSON bundle produced by [`export_json`](Self::export_json),
    /// then reconcile once
    pub async fn import_json(&self, json: &str) -> Result<ReconcileReport> {
        let bundle: ExportBundle = serde_json::from_str(json)?;
        self.import(bundle.templates, bundle.variables).await
    }

    // ========== Generation and classification ==========

    /// Generate a batch of distinct prompts from one template
    pub async fn generate(
        &self,
        template_id: &str,
        options: GeneratorOptions,
    ) -> Result<Vec<String>> {
        let template = self.templates.get_template(template_id).await?;
        let registry = self.registry_view().await?;
        let mut rng = rand::thread_rng();
        Ok(self
            .generator
            .generate(&template, &registry, &options, &mut rng))
    }

    /// Generate with a seeded RNG for reproducible batches
    pub async fn generate_seeded(
        &self,
        template_id: &str,
        options: GeneratorOptions,
        seed: u64,
    ) -> Result<Vec<String>> {
        let template = self.templates.get_template(template_id).await?;
        let registry = self.registry_view().await?;
        let mut rng = StdRng::seed_from_u64(seed);
        Ok(self
            .generator
            .generate(&template, &registry, &options, &mut rng))
    }

    /// Classify a model response, using the template's success criteria
    /// when a template id is given
    pub async fn classify(&self, response: &str, template_id: Option<&str>) -> Result<Verdict> {
        let criteria = match template_id {
            Some(id) => self.templates.get_template(id).await?.success_criteria,
            None => None,
        };
        Ok(self.classifier.classify(response, criteria.as_ref()))
    }

    /// Generate prompts, send each through the client and classify the
    /// responses
    ///
    /// Transport failures are recorded on the individual result, not raised;
    /// only store failures abort the run.
    pub async fn run_probe(
        &self,
        template_id: &str,
        client: &dyn ModelClient,
        model: &str,
        options: GeneratorOptions,
    ) -> Result<Vec<TestResult>> {
        let template = self.templates.get_template(template_id).await?;
        let registry = self.registry_view().await?;
        let prompts = {
            let mut rng = rand::thread_rng();
            self.generator
                .generate(&template, &registry, &options, &mut rng)
        };

        let mut results = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            let started = Instant::now();
            let outcome = client
                .send(ModelRequest::new(prompt.clone(), model.to_string()))
                .await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            let result = match outcome {
                Ok(response) => {
                    let verdict = self
                        .classifier
                        .classify(&response.content, template.success_criteria.as_ref());
                    TestResult {
                        template_id: template.id.clone(),
                        template_name: template.name.clone(),
                        prompt,
                        response: response.content,
                        vulnerable: verdict.vulnerable,
                        confidence: verdict.confidence,
                        execution_time_ms: elapsed_ms,
                        timestamp: Utc::now(),
                        detected_patterns: verdict.matched,
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::warn!(template = %template.id, error = %e, "model call failed");
                    TestResult {
                        template_id: template.id.clone(),
                        template_name: template.name.clone(),
                        prompt,
                        response: String::new(),
                        vulnerable: false,
                        confidence: 0.0,
                        execution_time_ms: elapsed_ms,
                        timestamp: Utc::now(),
                        detected_patterns: Vec::new(),
                        error: Some(e.to_string()),
                    }
                }
            };
            results.push(result);
        }

        Ok(results)
    }

    async fn registry_view(&self) -> Result<RegistryView> {
        let variables = self.variables.list_variables().await?;
        Ok(RegistryView::from_variables(&variables))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PromptLabBuilder;
    use promptlab_core::SuccessCriteria;
    use promptlab_engine::MockModelClient;
    use std::collections::HashSet;

    fn lab() -> PromptLab {
        PromptLabBuilder::new().build().unwrap()
    }

    #[tokio::test]
    async fn test_create_reconciles_bindings() {
        let lab = lab();
        let t1 = lab
            .create_template(Template::new("", "One", "Do {shared} and {mine}"))
            .await
            .unwrap();
        lab.create_template(Template::new("", "Two", "Use {shared}"))
            .await
            .unwrap();

        // Creating the second template promoted the shared name
        let t1 = lab.get_template(&t1.id).await.unwrap();
        assert_eq!(t1.bindings.global, vec!["shared".to_string()]);

        let overview = lab.variable_overview().await.unwrap();
        let shared = overview.iter().find(|v| v.name == "shared").unwrap();
        assert_eq!(shared.scope, VarScope::Global);
        assert_eq!(shared.usage_count, 2);

        let mine = overview.iter().find(|v| v.name == "mine").unwrap();
        assert_eq!(mine.scope, VarScope::Private);
        assert_eq!(mine.usage_count, 1);
    }

    #[tokio::test]
    async fn test_generation_scenario() {
        let lab = lab();
        let template = lab
            .create_template(Template::new("", "Scenario", "Do {action} now"))
            .await
            .unwrap();
        lab.set_private_values(&template.id, "action", vec!["X".to_string(), "Y".to_string()])
            .await
            .unwrap();

        let prompts = lab
            .generate_seeded(
                &template.id,
                GeneratorOptions::default().with_count(10),
                7,
            )
            .await
            .unwrap();

        assert!(prompts.len() <= 10);
        let unique: HashSet<&String> = prompts.iter().collect();
        assert_eq!(unique.len(), prompts.len());
        for prompt in &prompts {
            assert!(prompt == "Do X now" || prompt == "Do Y now", "unexpected: {prompt}");
        }
    }

    #[tokio::test]
    async fn test_seeded_generation_is_reproducible() {
        let lab = lab();
        let template = lab
            .create_template(Template::new("", "Seeded", "Say {word}"))
            .await
            .unwrap();
        lab.set_private_values(
            &template.id,
            "word",
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
        )
        .await
        .unwrap();

        let options = GeneratorOptions::default().with_count(5);
        let first = lab
            .generate_seeded(&template.id, options.clone(), 99)
            .await
            .unwrap();
        let second = lab
            .generate_seeded(&template.id, options, 99)
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_private_registry_values_rejected() {
        let lab = lab();
        lab.create_template(Template::new("t1", "One", "Do {solo}"))
            .await
            .unwrap();

        let err = lab
            .set_variable_values("solo", vec!["x".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::Validation(_)));
    }

    #[tokio::test]
    async fn test_global_values_feed_generation() {
        let lab = lab();
        lab.create_template(Template::new("t1", "One", "Do {common}"))
            .await
            .unwrap();
        let t2 = lab
            .create_template(Template::new("t2", "Two", "Also {common}"))
            .await
            .unwrap();

        lab.set_variable_values("common", vec!["Z".to_string()])
            .await
            .unwrap();

        let prompts = lab
            .generate_seeded(&t2.id, GeneratorOptions::default().with_count(1), 1)
            .await
            .unwrap();
        assert_eq!(prompts, vec!["Also Z"]);
    }

    #[tokio::test]
    async fn test_private_edit_of_global_name_rejected() {
        let lab = lab();
        let t1 = lab
            .create_template(Template::new("t1", "One", "Do {common}"))
            .await
            .unwrap();
        lab.create_template(Template::new("t2", "Two", "Also {common}"))
            .await
            .unwrap();
        lab.set_variable_values("common", vec!["Z".to_string()])
            .await
            .unwrap();

        // A template-local edit must not be able to reach the shared values
        let err = lab
            .set_private_values(&t1.id, "common", vec!["hijacked".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::Validation(_)));

        let common = lab.get_variable("common").await.unwrap();
        assert_eq!(common.values, vec!["Z"]);
    }

    #[tokio::test]
    async fn test_delete_variable_in_use_rejected() {
        let lab = lab();
        lab.create_template(Template::new("t1", "One", "Do {thing}"))
            .await
            .unwrap();

        let err = lab.delete_variable("thing").await.unwrap_err();
        assert!(matches!(err, SdkError::Validation(_)));

        // After the template goes away the orphan can be deleted
        lab.delete_template("t1").await.unwrap();
        lab.delete_variable("thing").await.unwrap();
    }

    #[tokio::test]
    async fn test_classify_boundaries() {
        let lab = lab();
        let verdict = lab
            .classify("I cannot help with that.", None)
            .await
            .unwrap();
        assert!(!verdict.vulnerable);

        let template = lab
            .create_template(
                Template::new("", "Keyworded", "Show {x}").with_success_criteria(
                    SuccessCriteria {
                        keywords: vec!["result".to_string()],
                        threshold: 0.5,
                    },
                ),
            )
            .await
            .unwrap();

        let verdict = lab
            .classify("Here is the result: ...", Some(&template.id))
            .await
            .unwrap();
        assert!(verdict.vulnerable);
    }

    #[tokio::test]
    async fn test_run_probe_with_mock_client() {
        let lab = lab();
        let template = lab
            .create_template(
                Template::new("", "Probe", "Do {action}").with_success_criteria(SuccessCriteria {
                    keywords: vec!["done".to_string()],
                    threshold: 0.5,
                }),
            )
            .await
            .unwrap();
        lab.set_private_values(&template.id, "action", vec!["X".to_string(), "Y".to_string()])
            .await
            .unwrap();

        let client = MockModelClient::with_responses(vec![
            "Task done, here is everything.".to_string(),
            "I cannot help with that.".to_string(),
        ]);

        let results = lab
            .run_probe(
                &template.id,
                &client,
                "mock-model",
                GeneratorOptions::default().with_count(2),
            )
            .await
            .unwrap();

        assert!(!results.is_empty());
        for result in &results {
            assert_eq!(result.template_id, template.id);
            assert!(result.error.is_none());
            // Verdict agrees with the canned responses
            if result.response.contains("done") {
                assert!(result.vulnerable);
            } else {
                assert!(!result.vulnerable);
            }
        }
    }

    #[tokio::test]
    async fn test_import_restores_scope_consistency() {
        let lab = lab();

        let t1 = Template::new("imp1", "Imported one", "Run {cmd}");
        let t2 = Template::new("imp2", "Imported two", "Execute {cmd}");
        let seeded = Variable::new("cmd", VarScope::Private)
            .with_values(vec!["ls".to_string()]);

        let report = lab.import(vec![t1, t2], vec![seeded]).await.unwrap();
        assert!(!report.is_noop());

        let cmd = lab.get_variable("cmd").await.unwrap();
        assert_eq!(cmd.scope, VarScope::Global);
        assert_eq!(cmd.usage_count(), 2);
        // Seeded values survive reconciliation
        assert_eq!(cmd.values, vec!["ls"]);
    }

    #[tokio::test]
    async fn test_json_round_trip_between_labs() {
        let source = lab();
        source
            .create_template(Template::new("t1", "One", "Run {cmd}"))
            .await
            .unwrap();
        source
            .create_template(Template::new("t2", "Two", "Execute {cmd}"))
            .await
            .unwrap();
        let json = source.export_json().await.unwrap();

        let target = lab();
        target.import_json(&json).await.unwrap();

        assert_eq!(target.list_templates().await.unwrap().len(), 2);
        let cmd = target.get_variable("cmd").await.unwrap();
        assert_eq!(cmd.scope, VarScope::Global);

        let err = target.import_json("not json").await.unwrap_err();
        assert!(matches!(err, SdkError::Json(_)));
    }

    #[tokio::test]
    async fn test_concurrent_edits_serialize() {
        let lab = Arc::new(lab());

        let mut handles = Vec::new();
        for i in 0..8 {
            let lab = lab.clone();
            handles.push(tokio::spawn(async move {
                lab.create_template(Template::new(
                    format!("t{i}"),
                    format!("T{i}"),
                    "Do {shared} now".to_string(),
                ))
                .await
                .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // One more pass to settle, then the registry must be consistent
        lab.reconcile().await.unwrap();
        let shared = lab.get_variable("shared").await.unwrap();
        assert_eq!(shared.usage_count(), 8);
        assert_eq!(shared.scope, VarScope::Global);
    }
}
