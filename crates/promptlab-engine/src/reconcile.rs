//! Scope classification and registry reconciliation
//!
//! Scope is purely usage-count driven: a variable referenced by exactly one
//! template is private, by two or more is global. Reconciliation recomputes
//! this over the full template set and rewrites both the registry and the
//! per-template bindings to match, without discarding values an operator has
//! entered.
//!
//! Two templates using the same placeholder name for unrelated concepts
//! cannot be distinguished here; they share one registry entry. This is a
//! known limitation of the usage-count rule, kept deliberately.

use chrono::Utc;
use promptlab_core::{detect, Template, VarScope, Variable};
use promptlab_store::{TemplateStore, VariableStore};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::error::EngineResult;

/// Counters describing what one reconciliation pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Registry entries created for newly seen names
    pub created: usize,
    /// Existing registry entries whose scope, usage or values changed
    pub updated: usize,
    /// Entries whose last referencing template went away
    pub orphaned: usize,
    /// Private entries that became global (usage 1 -> >=2)
    pub promoted: usize,
    /// Global entries that became private (usage -> 1)
    pub demoted: usize,
    /// Templates whose bindings were rewritten
    pub templates_rewritten: usize,
}

impl ReconcileReport {
    /// Whether the pass changed nothing (a repeated call is a no-op)
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// Keeps the variable registry consistent with the template set
///
/// Safe to call repeatedly; a second pass over unchanged data is a no-op.
/// Store failures propagate to the caller, everything else is handled.
pub struct Reconciler {
    templates: Arc<dyn TemplateStore>,
    variables: Arc<dyn VariableStore>,
}

impl Reconciler {
    /// Create a reconciler over the given stores
    pub fn new(templates: Arc<dyn TemplateStore>, variables: Arc<dyn VariableStore>) -> Self {
        Self {
            templates,
            variables,
        }
    }

    /// Recompute variable scopes from the current template set
    ///
    /// Always reads the latest snapshot from the template store at call
    /// time. Callers that allow concurrent template edits must serialize
    /// calls to this method (read-modify-write on the registry is not safe
    /// under concurrent writers).
    pub async fn reconcile(&self) -> EngineResult<ReconcileReport> {
        let mut report = ReconcileReport::default();

        let loaded = self.templates.list_templates().await?;
        let mut templates: BTreeMap<String, Template> =
            loaded.into_iter().map(|t| (t.id.clone(), t)).collect();

        // Detection pass and reverse index: name -> referencing template ids
        let mut detected: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut usage: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (id, template) in &templates {
            let names = detect(&template.text);
            for name in &names {
                usage.entry(name.clone()).or_default().insert(id.clone());
            }
            detected.insert(id.clone(), names);
        }

        let existing: BTreeMap<String, Variable> = self
            .variables
            .list_variables()
            .await?
            .into_iter()
            .map(|v| (v.name.clone(), v))
            .collect();

        // Templates whose bindings were touched outside the rewrite pass
        let mut seeded: BTreeSet<String> = BTreeSet::new();
        let mut final_scope: BTreeMap<String, VarScope> = BTreeMap::new();

        for (name, ids) in &usage {
            let new_scope = VarScope::from_usage(ids.len());
            final_scope.insert(name.clone(), new_scope);

            match existing.get(name) {
                Some(current) => {
                    let mut entry = current.clone();
                    let old_scope = entry.scope;

                    if new_scope == VarScope::Global {
                        // Union template-held private values into the shared
                        // list; the bindings are cleared in the rewrite pass,
                        // so the merge runs exactly once
                        for tid in ids {
                            if let Some(values) =
                                templates.get(tid).and_then(|t| t.bindings.private.get(name))
                            {
                                entry.merge_values(values);
                            }
                        }
                        if old_scope == VarScope::Private {
                            tracing::debug!(%name, usage = ids.len(), "variable promoted to global");
                            report.promoted += 1;
                        }
                    } else if old_scope == VarScope::Global {
                        // The surviving template takes a copy of the shared
                        // values as its private starting values, unless the
                        // operator already entered some
                        if let Some(tid) = ids.iter().next() {
                            if let Some(template) = templates.get_mut(tid) {
                                let binding =
                                    template.bindings.private.entry(name.clone()).or_default();
                                if binding.is_empty() && !entry.values.is_empty() {
                                    *binding = entry.values.clone();
                                    seeded.insert(tid.clone());
                                }
                            }
                        }
                        tracing::debug!(%name, "variable demoted to private");
                        report.demoted += 1;
                    }

                    entry.scope = new_scope;
                    entry.used_by = ids.clone();

                    if entry.scope != current.scope
                        || entry.used_by != current.used_by
                        || entry.values != current.values
                    {
                        entry.updated_at = Utc::now();
                        self.variables.update_variable(&entry).await?;
                        report.updated += 1;
                    }
                }
                None => {
                    let mut entry = Variable::new(name.clone(), new_scope);
                    entry.used_by = ids.clone();
                    entry.description = match new_scope {
                        VarScope::Global => "Shared variable".to_string(),
                        VarScope::Private => "Template variable".to_string(),
                    };
                    if new_scope == VarScope::Global {
                        for tid in ids {
                            if let Some(values) =
                                templates.get(tid).and_then(|t| t.bindings.private.get(name))
                            {
                                entry.merge_values(values);
                            }
                        }
                    }
                    self.variables.create_variable(&entry).await?;
                    report.created += 1;
                }
            }
        }

        // Entries no template references anymore: clear the usage set but
        // keep values and scope as orphaned history. Deletion is a separate,
        // explicit operator action.
        for (name, current) in &existing {
            if !usage.contains_key(name) && !current.used_by.is_empty() {
                let mut entry = current.clone();
                entry.used_by.clear();
                entry.updated_at = Utc::now();
                self.variables.update_variable(&entry).await?;
                report.orphaned += 1;
            }
        }

        // Rewrite each template's bindings to match the computed scopes:
        // prune names no longer in the text, list global names, keep private
        // bindings only for private names
        for (id, names) in &detected {
            let template = match templates.get_mut(id) {
                Some(template) => template,
                None => continue,
            };

            let mut next = template.bindings.clone();
            next.prune(names);
            next.global = names
                .iter()
                .filter(|n| final_scope.get(*n) == Some(&VarScope::Global))
                .cloned()
                .collect();
            next.private
                .retain(|n, _| final_scope.get(n) == Some(&VarScope::Private));

            if next != template.bindings || seeded.contains(id) {
                template.bindings = next;
                template.updated_at = Utc::now();
                self.templates.update_template(template).await?;
                report.templates_rewritten += 1;
            }
        }

        tracing::info!(
            created = report.created,
            updated = report.updated,
            orphaned = report.orphaned,
            promoted = report.promoted,
            demoted = report.demoted,
            templates = report.templates_rewritten,
            "reconciliation pass complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptlab_store::MemoryStore;

    fn reconciler(store: &MemoryStore) -> Reconciler {
        Reconciler::new(Arc::new(store.clone()), Arc::new(store.clone()))
    }

    async fn add_template(store: &MemoryStore, template: Template) {
        store.create_template(&template).await.unwrap();
    }

    #[tokio::test]
    async fn test_scope_from_usage_counts() {
        let store = MemoryStore::new();
        add_template(&store, Template::new("t1", "One", "Do {shared} and {only_here}")).await;
        add_template(&store, Template::new("t2", "Two", "Repeat {shared}")).await;

        let report = reconciler(&store).reconcile().await.unwrap();
        assert_eq!(report.created, 2);

        let shared = store.get_variable("shared").await.unwrap();
        assert_eq!(shared.scope, VarScope::Global);
        assert_eq!(shared.usage_count(), 2);

        let only_here = store.get_variable("only_here").await.unwrap();
        assert_eq!(only_here.scope, VarScope::Private);
        assert_eq!(only_here.usage_count(), 1);
    }

    #[tokio::test]
    async fn test_idempotent() {
        let store = MemoryStore::new();
        add_template(
            &store,
            Template::new("t1", "One", "Do {a} with {b}")
                .with_private_values("a", vec!["x".to_string()]),
        )
        .await;
        add_template(&store, Template::new("t2", "Two", "Use {a}")).await;

        let reconciler = reconciler(&store);
        let first = reconciler.reconcile().await.unwrap();
        assert!(!first.is_noop());

        let vars_after_first = store.list_variables().await.unwrap();
        let templates_after_first = store.list_templates().await.unwrap();

        let second = reconciler.reconcile().await.unwrap();
        assert!(second.is_noop(), "second pass should change nothing: {second:?}");
        assert_eq!(store.list_variables().await.unwrap(), vars_after_first);
        assert_eq!(store.list_templates().await.unwrap(), templates_after_first);
    }

    #[tokio::test]
    async fn test_promotion_merges_private_values() {
        let store = MemoryStore::new();
        add_template(
            &store,
            Template::new("t1", "One", "Do {action}")
                .with_private_values("action", vec!["scan".to_string(), "probe".to_string()]),
        )
        .await;

        let reconciler = reconciler(&store);
        reconciler.reconcile().await.unwrap();
        assert_eq!(
            store.get_variable("action").await.unwrap().scope,
            VarScope::Private
        );

        // A second template starts using the same name
        add_template(&store, Template::new("t2", "Two", "Also {action}")).await;
        let report = reconciler.reconcile().await.unwrap();
        assert_eq!(report.promoted, 1);

        let action = store.get_variable("action").await.unwrap();
        assert_eq!(action.scope, VarScope::Global);
        assert_eq!(action.values, vec!["scan", "probe"]);

        // The private binding moved into the registry
        let t1 = store.get_template("t1").await.unwrap();
        assert!(!t1.bindings.private.contains_key("action"));
        assert_eq!(t1.bindings.global, vec!["action".to_string()]);
    }

    #[tokio::test]
    async fn test_demotion_copies_registry_values() {
        let store = MemoryStore::new();
        add_template(
            &store,
            Template::new("t1", "One", "Do {action}")
                .with_private_values("action", vec!["scan".to_string()]),
        )
        .await;
        add_template(&store, Template::new("t2", "Two", "Also {action}")).await;

        let reconciler = reconciler(&store);
        reconciler.reconcile().await.unwrap();

        // Drop one reference; the survivor gets a copy of the shared values
        store.delete_template("t2").await.unwrap();
        let report = reconciler.reconcile().await.unwrap();
        assert_eq!(report.demoted, 1);

        let action = store.get_variable("action").await.unwrap();
        assert_eq!(action.scope, VarScope::Private);
        // Accumulated values survive the scope flip
        assert_eq!(action.values, vec!["scan"]);

        let t1 = store.get_template("t1").await.unwrap();
        assert_eq!(
            t1.bindings.private.get("action"),
            Some(&vec!["scan".to_string()])
        );
        assert!(t1.bindings.global.is_empty());
    }

    #[tokio::test]
    async fn test_demotion_keeps_operator_entered_values() {
        let store = MemoryStore::new();
        add_template(&store, Template::new("t1", "One", "Do {action}")).await;
        add_template(&store, Template::new("t2", "Two", "Also {action}")).await;

        let reconciler = reconciler(&store);
        reconciler.reconcile().await.unwrap();

        // Operator fills the shared values, then edits t1's private copy
        let mut action = store.get_variable("action").await.unwrap();
        action.values = vec!["from-registry".to_string()];
        store.update_variable(&action).await.unwrap();

        store.delete_template("t2").await.unwrap();
        let mut t1 = store.get_template("t1").await.unwrap();
        t1.bindings
            .private
            .insert("action".to_string(), vec!["user-entered".to_string()]);
        store.update_template(&t1).await.unwrap();

        reconciler.reconcile().await.unwrap();

        // The user-entered value is not overwritten by the registry copy
        let t1 = store.get_template("t1").await.unwrap();
        assert_eq!(
            t1.bindings.private.get("action"),
            Some(&vec!["user-entered".to_string()])
        );
    }

    #[tokio::test]
    async fn test_orphan_retained_with_values() {
        let store = MemoryStore::new();
        add_template(
            &store,
            Template::new("t1", "One", "Do {action}")
                .with_private_values("action", vec!["scan".to_string()]),
        )
        .await;

        let reconciler = reconciler(&store);
        reconciler.reconcile().await.unwrap();

        store.delete_template("t1").await.unwrap();
        let report = reconciler.reconcile().await.unwrap();
        assert_eq!(report.orphaned, 1);

        // Entry survives with its history, referenced by nothing
        let action = store.get_variable("action").await.unwrap();
        assert!(action.is_orphaned());
    }

    #[tokio::test]
    async fn test_stale_bindings_pruned() {
        let store = MemoryStore::new();
        let mut template = Template::new("t1", "One", "Do {kept}")
            .with_private_values("kept", vec!["v".to_string()]);
        template
            .bindings
            .private
            .insert("removed".to_string(), vec!["old".to_string()]);
        template.bindings.global.push("ghost".to_string());
        add_template(&store, template).await;

        reconciler(&store).reconcile().await.unwrap();

        let t1 = store.get_template("t1").await.unwrap();
        assert!(t1.bindings.private.contains_key("kept"));
        assert!(!t1.bindings.private.contains_key("removed"));
        assert!(t1.bindings.global.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_occurrences_count_once() {
        let store = MemoryStore::new();
        add_template(&store, Template::new("t1", "One", "{x} and {x} and {x}")).await;

        reconciler(&store).reconcile().await.unwrap();

        let x = store.get_variable("x").await.unwrap();
        assert_eq!(x.usage_count(), 1);
        assert_eq!(x.scope, VarScope::Private);
    }
}
