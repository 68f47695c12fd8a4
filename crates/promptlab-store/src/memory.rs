//! In-memory store implementation
//!
//! Backed by `tokio::sync::RwLock` maps. Used as the default store for tests
//! and embedded single-process setups.

use async_trait::async_trait;
use promptlab_core::{Template, Variable};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{error::StoreError, traits::*, StoreResult};

/// Memory-backed store for templates and variables
#[derive(Clone, Default)]
pub struct MemoryStore {
    templates: Arc<RwLock<HashMap<String, Template>>>,
    variables: Arc<RwLock<HashMap<String, Variable>>>,
}

impl MemoryStore {
    /// Create an empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored templates
    pub async fn template_count(&self) -> usize {
        self.templates.read().await.len()
    }

    /// Number of stored variables
    pub async fn variable_count(&self) -> usize {
        self.variables.read().await.len()
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn create_template(&self, template: &Template) -> StoreResult<()> {
        let mut templates = self.templates.write().await;
        if templates.contains_key(&template.id) {
            return Err(StoreError::Conflict {
                id: template.id.clone(),
            });
        }
        templates.insert(template.id.clone(), template.clone());
        Ok(())
    }

    async fn get_template(&self, id: &str) -> StoreResult<Template> {
        self.templates
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    async fn update_template(&self, template: &Template) -> StoreResult<()> {
        let mut templates = self.templates.write().await;
        if !templates.contains_key(&template.id) {
            return Err(StoreError::NotFound {
                id: template.id.clone(),
            });
        }
        templates.insert(template.id.clone(), template.clone());
        Ok(())
    }

    async fn delete_template(&self, id: &str) -> StoreResult<()> {
        self.templates
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    async fn list_templates(&self) -> StoreResult<Vec<Template>> {
        let mut templates: Vec<Template> = self.templates.read().await.values().cloned().collect();
        // Stable order for callers and test fixtures
        templates.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(templates)
    }

    async fn list_templates_by_category(&self, category: &str) -> StoreResult<Vec<Template>> {
        let mut templates: Vec<Template> = self
            .templates
            .read()
            .await
            .values()
            .filter(|t| t.category == category)
            .cloned()
            .collect();
        templates.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(templates)
    }
}

#[async_trait]
impl VariableStore for MemoryStore {
    async fn create_variable(&self, variable: &Variable) -> StoreResult<()> {
        let mut variables = self.variables.write().await;
        if variables.contains_key(&variable.name) {
            return Err(StoreError::Conflict {
                id: variable.name.clone(),
            });
        }
        variables.insert(variable.name.clone(), variable.clone());
        Ok(())
    }

    async fn get_variable(&self, name: &str) -> StoreResult<Variable> {
        self.variables
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                id: name.to_string(),
            })
    }

    async fn find_variable(&self, name: &str) -> StoreResult<Option<Variable>> {
        Ok(self.variables.read().await.get(name).cloned())
    }

    async fn update_variable(&self, variable: &Variable) -> StoreResult<()> {
        let mut variables = self.variables.write().await;
        if !variables.contains_key(&variable.name) {
            return Err(StoreError::NotFound {
                id: variable.name.clone(),
            });
        }
        variables.insert(variable.name.clone(), variable.clone());
        Ok(())
    }

    async fn delete_variable(&self, name: &str) -> StoreResult<()> {
        self.variables
            .write()
            .await
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                id: name.to_string(),
            })
    }

    async fn list_variables(&self) -> StoreResult<Vec<Variable>> {
        let mut variables: Vec<Variable> = self.variables.read().await.values().cloned().collect();
        variables.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(variables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptlab_core::VarScope;

    #[tokio::test]
    async fn test_template_crud() {
        let store = MemoryStore::new();
        let template = Template::new("t1", "Probe", "Do {action}");

        store.create_template(&template).await.unwrap();
        assert!(matches!(
            store.create_template(&template).await,
            Err(StoreError::Conflict { .. })
        ));

        let mut loaded = store.get_template("t1").await.unwrap();
        assert_eq!(loaded.name, "Probe");

        loaded.name = "Renamed".to_string();
        store.update_template(&loaded).await.unwrap();
        assert_eq!(store.get_template("t1").await.unwrap().name, "Renamed");

        store.delete_template("t1").await.unwrap();
        assert!(matches!(
            store.get_template("t1").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_by_category() {
        let store = MemoryStore::new();
        store
            .create_template(&Template::new("a", "A", "{x}").with_category("role-playing"))
            .await
            .unwrap();
        store
            .create_template(&Template::new("b", "B", "{y}").with_category("injection"))
            .await
            .unwrap();

        let found = store.list_templates_by_category("role-playing").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "a");
    }

    #[tokio::test]
    async fn test_variable_crud() {
        let store = MemoryStore::new();
        let variable = Variable::new("action", VarScope::Private)
            .with_values(vec!["scan".to_string()]);

        store.create_variable(&variable).await.unwrap();
        assert!(store.find_variable("action").await.unwrap().is_some());
        assert!(store.find_variable("missing").await.unwrap().is_none());

        let mut loaded = store.get_variable("action").await.unwrap();
        loaded.values.push("probe".to_string());
        store.update_variable(&loaded).await.unwrap();
        assert_eq!(store.get_variable("action").await.unwrap().values.len(), 2);

        store.delete_variable("action").await.unwrap();
        assert!(matches!(
            store.delete_variable("action").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_order_is_stable() {
        let store = MemoryStore::new();
        for id in ["c", "a", "b"] {
            store
                .create_template(&Template::new(id, id, "{x}"))
                .await
                .unwrap();
        }
        let ids: Vec<String> = store
            .list_templates()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
