//! Legacy record migration
//!
//! Earlier releases stored per-template variables as a flat `variables` array
//! of `{name, options, default_value}` entries. The current shape is the
//! `bindings {global, private}` map maintained by reconciliation. Stores run
//! [`TemplateRecord::migrate`] exactly once at load time so that the rest of
//! the system only ever sees the current shape.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{CoreError, Result};
use crate::types::{RiskLevel, SuccessCriteria, Template, TemplateBindings};

/// Variable entry from the legacy flat array
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyVariable {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Single default value, used when no options were recorded
    #[serde(default)]
    pub default_value: Option<String>,

    /// Candidate values in the legacy shape
    #[serde(default)]
    pub options: Option<Vec<String>>,
}

/// Raw serde shape of a persisted template, current or legacy
///
/// Exactly one of `bindings` (current) or `variables` (legacy) is expected;
/// when both are absent the record migrates to empty bindings and
/// reconciliation fills them in.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateRecord {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub risk_level: RiskLevel,

    /// Older exports used the field name `template` for the raw text
    #[serde(alias = "template")]
    pub text: String,

    #[serde(default)]
    pub bindings: Option<TemplateBindings>,

    /// Legacy flat variable array
    #[serde(default)]
    pub variables: Option<Vec<LegacyVariable>>,

    #[serde(default)]
    pub success_criteria: Option<SuccessCriteria>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TemplateRecord {
    /// Convert a raw record into the current template shape
    ///
    /// Legacy `variables` entries become private bindings seeded from their
    /// `options` (or single `default_value`); names no longer detectable in
    /// the text are dropped. Records carrying current-shape `bindings` pass
    /// through unchanged.
    pub fn migrate(self) -> Result<Template> {
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidTemplate(format!(
                "template {} has an empty name",
                self.id
            )));
        }
        if let Some(criteria) = &self.success_criteria {
            if !(0.0..=1.0).contains(&criteria.threshold) {
                return Err(CoreError::InvalidTemplate(format!(
                    "template {} has threshold {} outside 0..1",
                    self.id, criteria.threshold
                )));
            }
        }

        let bindings = match (self.bindings, self.variables) {
            (Some(bindings), _) => bindings,
            (None, Some(legacy)) => {
                log::debug!("migrating legacy variable array for template {}", self.id);
                let detected = crate::detect::detect(&self.text);
                let mut bindings = TemplateBindings::default();
                for entry in legacy {
                    if entry.name.trim().is_empty() {
                        return Err(CoreError::InvalidVariable(format!(
                            "template {} carries a legacy variable without a name",
                            self.id
                        )));
                    }
                    if !detected.contains(&entry.name) {
                        continue;
                    }
                    let values = match (entry.options, entry.default_value) {
                        (Some(options), _) if !options.is_empty() => options,
                        (_, Some(default)) if !default.trim().is_empty() => vec![default],
                        _ => Vec::new(),
                    };
                    bindings.private.insert(entry.name, values);
                }
                bindings
            }
            (None, None) => TemplateBindings::default(),
        };

        let now = Utc::now();
        Ok(Template {
            id: self.id,
            name: self.name,
            description: self.description,
            category: self.category,
            risk_level: self.risk_level,
            text: self.text,
            bindings,
            success_criteria: self.success_criteria,
            tags: self.tags,
            created_at: self.created_at.unwrap_or(now),
            updated_at: self.updated_at.unwrap_or(now),
        })
    }
}
