//! Template and variable record definitions
//!
//! Templates carry parameterized prompt text with `{name}` placeholders.
//! Variables are registry entries shared across templates; their scope is
//! recomputed from usage counts during reconciliation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::detect;

/// Scope of a registry variable
///
/// Scope is a deterministic function of how many templates reference the
/// variable: exactly one referencing template makes it private, two or more
/// make it global.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarScope {
    /// Referenced by two or more templates; values are shared
    Global,
    /// Referenced by exactly one template; values are owned by that template
    Private,
}

impl VarScope {
    /// Compute scope from the number of referencing templates
    pub fn from_usage(count: usize) -> Self {
        if count >= 2 {
            VarScope::Global
        } else {
            VarScope::Private
        }
    }
}

/// Risk classification for a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Criteria used to judge whether a generated prompt succeeded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessCriteria {
    /// Keywords whose presence (case-insensitive) indicates success
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Confidence threshold in 0..1
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    0.5
}

impl Default for SuccessCriteria {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            threshold: default_threshold(),
        }
    }
}

/// Per-template variable bindings
///
/// `global` lists names resolved through the shared registry; `private` maps
/// names owned by this template to their candidate values. Every name must be
/// detectable in the template text; stale entries are pruned on
/// reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TemplateBindings {
    /// Names resolved through the shared registry
    #[serde(default)]
    pub global: Vec<String>,

    /// Template-owned names with their candidate values
    #[serde(default)]
    pub private: BTreeMap<String, Vec<String>>,
}

impl TemplateBindings {
    /// Whether no bindings are recorded at all
    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.private.is_empty()
    }

    /// Drop entries whose name is not in the detected set
    pub fn prune(&mut self, detected: &BTreeSet<String>) {
        self.global.retain(|name| detected.contains(name));
        self.private.retain(|name, _| detected.contains(name));
    }
}

/// A parameterized prompt template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Unique identifier, stable across edits
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Description of what the template probes
    #[serde(default)]
    pub description: String,

    /// Attack category (e.g. "role-playing", "instruction-injection")
    #[serde(default)]
    pub category: String,

    /// Risk classification
    #[serde(default)]
    pub risk_level: RiskLevel,

    /// Raw template text containing `{name}` placeholders
    pub text: String,

    /// Variable bindings, maintained by reconciliation
    #[serde(default)]
    pub bindings: TemplateBindings,

    /// Optional criteria for judging responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_criteria: Option<SuccessCriteria>,

    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Template {
    /// Create a new template with the given id, name and text
    pub fn new(id: impl Into<String>, name: impl Into<String>, text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category: String::new(),
            risk_level: RiskLevel::default(),
            text: text.into(),
            bindings: TemplateBindings::default(),
            success_criteria: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the risk level
    pub fn with_risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = risk_level;
        self
    }

    /// Set the success criteria
    pub fn with_success_criteria(mut self, criteria: SuccessCriteria) -> Self {
        self.success_criteria = Some(criteria);
        self
    }

    /// Set a private binding for one placeholder name
    pub fn with_private_values(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.bindings.private.insert(name.into(), values);
        self
    }

    /// Run the placeholder detector over this template's text
    pub fn detected_variables(&self) -> BTreeSet<String> {
        detect::detect(&self.text)
    }
}

/// A shared registry variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Unique name, used as the registry key
    pub name: String,

    /// Description shown to the operator
    #[serde(default)]
    pub description: String,

    /// Candidate values; ordered, duplicates allowed, empty allowed
    #[serde(default)]
    pub values: Vec<String>,

    /// Grouping category (e.g. "custom")
    #[serde(default)]
    pub category: String,

    /// Current scope, recomputed from `used_by` on reconciliation
    pub scope: VarScope,

    /// Identifiers of templates currently referencing this variable
    #[serde(default)]
    pub used_by: BTreeSet<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Variable {
    /// Create a new variable with the given name and scope
    pub fn new(name: impl Into<String>, scope: VarScope) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: String::new(),
            values: Vec::new(),
            category: "custom".to_string(),
            scope,
            used_by: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the candidate values
    pub fn with_values(mut self, values: Vec<String>) -> Self {
        self.values = values;
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Number of templates currently referencing this variable
    pub fn usage_count(&self) -> usize {
        self.used_by.len()
    }

    /// Whether no template references this variable anymore
    pub fn is_orphaned(&self) -> bool {
        self.used_by.is_empty()
    }

    /// Append values not already present, preserving order
    pub fn merge_values(&mut self, incoming: &[String]) {
        for value in incoming {
            if !self.values.contains(value) {
                self.values.push(value.clone());
            }
        }
    }
}

/// One row of the variable overview shown by the UI layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableOverview {
    pub name: String,
    pub scope: VarScope,
    pub usage_count: usize,
    pub value_count: usize,
}

/// Outcome of sending one generated prompt to a model endpoint
///
/// Owned by the external test-execution layer; referenced here for the
/// response classifier's contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Template the prompt was generated from
    pub template_id: String,

    /// Template name at execution time
    pub template_name: String,

    /// The concrete prompt that was sent
    pub prompt: String,

    /// The model's text response
    pub response: String,

    /// Classifier verdict; heuristic, not a certified result
    pub vulnerable: bool,

    /// Classifier confidence in 0..1
    pub confidence: f64,

    /// Wall-clock execution time of the outbound call
    pub execution_time_ms: u64,

    /// When the result was recorded
    pub timestamp: DateTime<Utc>,

    /// Keywords or refusal patterns that fired during classification
    #[serde(default)]
    pub detected_patterns: Vec<String>,

    /// Transport error, if the call failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_from_usage() {
        assert_eq!(VarScope::from_usage(0), VarScope::Private);
        assert_eq!(VarScope::from_usage(1), VarScope::Private);
        assert_eq!(VarScope::from_usage(2), VarScope::Global);
        assert_eq!(VarScope::from_usage(7), VarScope::Global);
    }

    #[test]
    fn test_template_builder() {
        let template = Template::new("t1", "Role play", "Act as {role} and {action}")
            .with_category("role-playing")
            .with_risk_level(RiskLevel::High)
            .with_private_values("role", vec!["admin".to_string()]);

        assert_eq!(template.id, "t1");
        assert_eq!(template.category, "role-playing");
        assert_eq!(template.risk_level, RiskLevel::High);
        assert_eq!(
            template.bindings.private.get("role"),
            Some(&vec!["admin".to_string()])
        );
    }

    #[test]
    fn test_detected_variables() {
        let template = Template::new("t1", "t", "Do {action} as {role}");
        let detected = template.detected_variables();
        assert!(detected.contains("action"));
        assert!(detected.contains("role"));
        assert_eq!(detected.len(), 2);
    }

    #[test]
    fn test_bindings_prune() {
        let mut bindings = TemplateBindings {
            global: vec!["kept".to_string(), "stale".to_string()],
            private: BTreeMap::from([
                ("kept2".to_string(), vec!["v".to_string()]),
                ("gone".to_string(), vec![]),
            ]),
        };
        let detected: BTreeSet<String> =
            ["kept".to_string(), "kept2".to_string()].into_iter().collect();

        bindings.prune(&detected);

        assert_eq!(bindings.global, vec!["kept".to_string()]);
        assert!(bindings.private.contains_key("kept2"));
        assert!(!bindings.private.contains_key("gone"));
    }

    #[test]
    fn test_merge_values_is_union() {
        let mut var = Variable::new("target", VarScope::Global)
            .with_values(vec!["a".to_string(), "b".to_string()]);

        var.merge_values(&["b".to_string(), "c".to_string()]);

        assert_eq!(var.values, vec!["a", "b", "c"]);
    }
}
