//! File system based store implementation
//!
//! One YAML document per record: templates under `templates/`, variables
//! under `variables/`, ids/names as file stems. Legacy template records are
//! migrated to the current shape at load time.

use async_trait::async_trait;
use promptlab_core::schema::TemplateRecord;
use promptlab_core::{Template, Variable};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::{error::StoreError, traits::*, StoreResult};

const TEMPLATES_DIR: &str = "templates";
const VARIABLES_DIR: &str = "variables";

/// File system backed store
pub struct FileSystemStore {
    /// Root directory holding `templates/` and `variables/`
    root: PathBuf,
}

impl FileSystemStore {
    /// Create a store rooted at the given directory
    ///
    /// The `templates/` and `variables/` subdirectories are created if they
    /// do not exist yet.
    pub fn new<P: AsRef<Path>>(root: P) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join(TEMPLATES_DIR))?;
        std::fs::create_dir_all(root.join(VARIABLES_DIR))?;
        Ok(Self { root })
    }

    fn template_path(&self, id: &str) -> StoreResult<PathBuf> {
        Ok(self.root.join(TEMPLATES_DIR).join(format!("{}.yaml", valid_stem(id)?)))
    }

    fn variable_path(&self, name: &str) -> StoreResult<PathBuf> {
        Ok(self
            .root
            .join(VARIABLES_DIR)
            .join(format!("{}.yaml", valid_stem(name)?)))
    }

    async fn read_template(&self, path: &Path) -> StoreResult<Template> {
        let content = fs::read_to_string(path).await?;
        let record: TemplateRecord = serde_yaml::from_str(&content)?;
        Ok(record.migrate()?)
    }

    async fn list_yaml_files(&self, dir: &str) -> StoreResult<Vec<PathBuf>> {
        let dir_path = self.root.join(dir);
        let mut entries = fs::read_dir(&dir_path).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_yaml = matches!(
                path.extension().and_then(|s| s.to_str()),
                Some("yaml") | Some("yml")
            );
            if path.is_file() && is_yaml {
                files.push(path);
            }
        }

        // Directory iteration order is platform-dependent
        files.sort();
        Ok(files)
    }
}

/// Reject identifiers that would escape the record directory
fn valid_stem(id: &str) -> StoreResult<&str> {
    if id.is_empty() || id.contains(['/', '\\', '\0']) || id == "." || id == ".." {
        return Err(StoreError::InvalidRecord(format!(
            "identifier not usable as a file stem: {id:?}"
        )));
    }
    Ok(id)
}

#[async_trait]
impl TemplateStore for FileSystemStore {
    async fn create_template(&self, template: &Template) -> StoreResult<()> {
        let path = self.template_path(&template.id)?;
        if path.exists() {
            return Err(StoreError::Conflict {
                id: template.id.clone(),
            });
        }
        let content = serde_yaml::to_string(template)?;
        fs::write(&path, content).await?;
        tracing::debug!(id = %template.id, "wrote template record");
        Ok(())
    }

    async fn get_template(&self, id: &str) -> StoreResult<Template> {
        let path = self.template_path(id)?;
        if !path.exists() {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        self.read_template(&path).await
    }

    async fn update_template(&self, template: &Template) -> StoreResult<()> {
        let path = self.template_path(&template.id)?;
        if !path.exists() {
            return Err(StoreError::NotFound {
                id: template.id.clone(),
            });
        }
        let content = serde_yaml::to_string(template)?;
        fs::write(&path, content).await?;
        tracing::debug!(id = %template.id, "updated template record");
        Ok(())
    }

    async fn delete_template(&self, id: &str) -> StoreResult<()> {
        let path = self.template_path(id)?;
        if !path.exists() {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        fs::remove_file(&path).await?;
        Ok(())
    }

    async fn list_templates(&self) -> StoreResult<Vec<Template>> {
        let mut templates = Vec::new();
        for path in self.list_yaml_files(TEMPLATES_DIR).await? {
            templates.push(self.read_template(&path).await?);
        }
        Ok(templates)
    }

    async fn list_templates_by_category(&self, category: &str) -> StoreResult<Vec<Template>> {
        let templates = self.list_templates().await?;
        Ok(templates
            .into_iter()
            .filter(|t| t.category == category)
            .collect())
    }
}

#[async_trait]
impl VariableStore for FileSystemStore {
    async fn create_variable(&self, variable: &Variable) -> StoreResult<()> {
        let path = self.variable_path(&variable.name)?;
        if path.exists() {
            return Err(StoreError::Conflict {
                id: variable.name.clone(),
            });
        }
        let content = serde_yaml::to_string(variable)?;
        fs::write(&path, content).await?;
        tracing::debug!(name = %variable.name, "wrote variable record");
        Ok(())
    }

    async fn get_variable(&self, name: &str) -> StoreResult<Variable> {
        self.find_variable(name)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                id: name.to_string(),
            })
    }

    async fn find_variable(&self, name: &str) -> StoreResult<Option<Variable>> {
        let path = self.variable_path(name)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).await?;
        let variable: Variable = serde_yaml::from_str(&content)?;
        Ok(Some(variable))
    }

    async fn update_variable(&self, variable: &Variable) -> StoreResult<()> {
        let path = self.variable_path(&variable.name)?;
        if !path.exists() {
            return Err(StoreError::NotFound {
                id: variable.name.clone(),
            });
        }
        let content = serde_yaml::to_string(variable)?;
        fs::write(&path, content).await?;
        Ok(())
    }

    async fn delete_variable(&self, name: &str) -> StoreResult<()> {
        let path = self.variable_path(name)?;
        if !path.exists() {
            return Err(StoreError::NotFound {
                id: name.to_string(),
            });
        }
        fs::remove_file(&path).await?;
        Ok(())
    }

    async fn list_variables(&self) -> StoreResult<Vec<Variable>> {
        let mut variables = Vec::new();
        for path in self.list_yaml_files(VARIABLES_DIR).await? {
            let content = fs::read_to_string(&path).await?;
            variables.push(serde_yaml::from_str(&content)?);
        }
        Ok(variables)
    }
}
