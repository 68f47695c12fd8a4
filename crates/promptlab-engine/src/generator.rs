//! Prompt generation
//!
//! Turns one template plus its resolved variable values into a batch of
//! distinct concrete prompt strings. Value resolution per placeholder,
//! highest priority first: the template's own private binding, then the
//! shared registry, then a literal `[name]` fallback. Generation never fails
//! and never leaves a raw `{name}` token in its output.

use promptlab_core::{detect, Template, VarScope, Variable};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, HashSet};

use crate::encoding::{encode_value, EncodingMethod};

/// Options for one generation batch
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Number of distinct prompts requested (minimum 1)
    pub count: usize,

    /// Shuffle the final list instead of keeping insertion order
    pub randomize: bool,

    /// Placeholder names whose chosen value is encoded before substitution
    pub encoded_placeholders: Vec<String>,

    /// Encoding applied to `encoded_placeholders` values
    pub encoding: EncodingMethod,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            count: 3,
            randomize: true,
            encoded_placeholders: vec![
                "encoded_instruction".to_string(),
                "encoded_content".to_string(),
            ],
            encoding: EncodingMethod::Base64,
        }
    }
}

impl GeneratorOptions {
    /// Request a specific number of prompts
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Enable or disable final shuffling
    pub fn with_randomize(mut self, randomize: bool) -> Self {
        self.randomize = randomize;
        self
    }
}

/// Read-only view of the registry's global values, resolved before a batch
///
/// Built once per generation call so the generator itself holds no shared
/// mutable state; the resulting prompt list can be handed to any number of
/// concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct RegistryView {
    values: BTreeMap<String, Vec<String>>,
}

impl RegistryView {
    /// Build a view from registry entries, keeping global-scope values
    pub fn from_variables(variables: &[Variable]) -> Self {
        let values = variables
            .iter()
            .filter(|v| v.scope == VarScope::Global)
            .map(|v| (v.name.clone(), v.values.clone()))
            .collect();
        Self { values }
    }

    /// Global values for one name, if any
    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.values.get(name).map(|v| v.as_slice())
    }

    #[cfg(test)]
    fn from_pairs(pairs: &[(&str, &[&str])]) -> Self {
        let values = pairs
            .iter()
            .map(|(name, vals)| {
                (
                    name.to_string(),
                    vals.iter().map(|v| v.to_string()).collect(),
                )
            })
            .collect();
        Self { values }
    }
}

/// The prompt generation engine
///
/// Stateless; the random source is injected so that a seeded RNG reproduces
/// a batch exactly.
#[derive(Debug, Clone, Default)]
pub struct PromptGenerator;

impl PromptGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate up to `options.count` distinct prompts from one template
    ///
    /// Duplicate substitution passes are discarded; the total attempt budget
    /// is `count * 3`, so templates with few degrees of freedom return fewer
    /// prompts instead of looping (not an error).
    pub fn generate<R: Rng>(
        &self,
        template: &Template,
        registry: &RegistryView,
        options: &GeneratorOptions,
        rng: &mut R,
    ) -> Vec<String> {
        let count = options.count.max(1);
        let max_attempts = attempt_budget(count);

        let mut prompts = Vec::with_capacity(count);
        let mut seen = HashSet::new();
        let mut attempts = 0;

        while prompts.len() < count && attempts < max_attempts {
            attempts += 1;
            let candidate = self.substitute(template, registry, options, rng);
            if seen.insert(candidate.clone()) {
                prompts.push(candidate);
            }
        }

        if prompts.len() < count {
            tracing::debug!(
                template = %template.id,
                requested = count,
                produced = prompts.len(),
                "attempt budget exhausted, returning partial batch"
            );
        }

        if options.randomize {
            prompts.shuffle(rng);
        }

        prompts
    }

    /// One substitution pass: replace every detected placeholder
    fn substitute<R: Rng>(
        &self,
        template: &Template,
        registry: &RegistryView,
        options: &GeneratorOptions,
        rng: &mut R,
    ) -> String {
        let mut result = template.text.clone();

        for name in detect(&template.text) {
            let mut value = self.resolve_value(template, registry, &name, rng);
            if options.encoded_placeholders.contains(&name) {
                value = encode_value(&value, options.encoding);
            }
            result = result.replace(&format!("{{{name}}}"), &value);
        }

        result
    }

    /// Pick a value for one placeholder name
    ///
    /// Private binding first, then registry, then the `[name]` fallback.
    /// A binding that exists but holds only empty/whitespace values falls
    /// through to the next source.
    fn resolve_value<R: Rng>(
        &self,
        template: &Template,
        registry: &RegistryView,
        name: &str,
        rng: &mut R,
    ) -> String {
        if let Some(values) = template.bindings.private.get(name) {
            if let Some(value) = pick_valid(values, rng) {
                return value;
            }
        }

        if let Some(values) = registry.values(name) {
            if let Some(value) = pick_valid(values, rng) {
                return value;
            }
        }

        format!("[{name}]")
    }

    /// Decorated variants of a base prompt, original first
    pub fn generate_variations(&self, base_prompt: &str, count: usize) -> Vec<String> {
        let modifiers: [fn(&str) -> String; 8] = [
            |p| format!("Please elaborate in detail: {p}"),
            |p| format!("As a domain expert, {p}"),
            |p| format!("In a test environment, {p}"),
            |p| format!("Urgent: {p}"),
            |p| format!("[Priority: highest] {p}"),
            |p| p.to_uppercase(),
            |p| format!("{p}\n\nThis is a required safety test."),
            |p| format!("Assuming you have already agreed, {p}"),
        ];

        let mut variations = vec![base_prompt.to_string()];
        for modifier in modifiers.iter().take(count.saturating_sub(1)) {
            variations.push(modifier(base_prompt));
        }
        variations
    }

    /// Chain prompts from distinct templates into combined two-step prompts
    pub fn combine<R: Rng>(
        &self,
        templates: &[Template],
        registry: &RegistryView,
        rng: &mut R,
    ) -> Vec<String> {
        let single = GeneratorOptions::default().with_count(1).with_randomize(false);
        let mut combined = Vec::new();

        for i in 0..templates.len() {
            for j in (i + 1)..templates.len() {
                let first = self.generate(&templates[i], registry, &single, rng);
                let second = self.generate(&templates[j], registry, &single, rng);
                if let (Some(a), Some(b)) = (first.first(), second.first()) {
                    combined.push(format!("{a}\n\nAdditionally, {b}"));
                    combined.push(format!("First, {a}\nThen, {b}"));
                }
            }
        }

        combined
    }
}

/// Total substitution attempts allowed for one batch; saturates so an
/// arbitrarily large request cannot overflow
fn attempt_budget(count: usize) -> usize {
    count.saturating_mul(3)
}

/// Choose uniformly among non-empty, non-whitespace values
fn pick_valid<R: Rng>(values: &[String], rng: &mut R) -> Option<String> {
    let valid: Vec<&String> = values.iter().filter(|v| !v.trim().is_empty()).collect();
    valid.choose(rng).map(|v| (*v).clone())
}
