//! Store trait definitions
//!
//! Two record kinds with independent stores:
//!
//! - [`TemplateStore`]: CRUD plus list-by-category for prompt templates
//! - [`VariableStore`]: CRUD plus name lookup for registry variables
//!
//! Variables are keyed by their unique name; templates by their opaque id.
//! All operations are async for non-blocking I/O, and implementations must be
//! `Send + Sync` for use across async tasks.
//!
//! # Examples
//!
//! ```no_run
//! use promptlab_core::{Template, VarScope, Variable};
//! use promptlab_store::{MemoryStore, TemplateStore, VariableStore};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let store = MemoryStore::new();
//!
//! store
//!     .create_template(&Template::new("t1", "Probe", "Do {action}"))
//!     .await?;
//! store
//!     .create_variable(&Variable::new("action", VarScope::Private))
//!     .await?;
//!
//! for variable in store.list_variables().await? {
//!     println!("{} ({:?})", variable.name, variable.scope);
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use promptlab_core::{Template, Variable};

use crate::StoreResult;

/// Store for prompt templates, keyed by opaque id
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Insert a new template
    ///
    /// Fails with [`StoreError::Conflict`](crate::StoreError::Conflict) if a
    /// template with the same id already exists.
    async fn create_template(&self, template: &Template) -> StoreResult<()>;

    /// Load a template by id
    async fn get_template(&self, id: &str) -> StoreResult<Template>;

    /// Replace an existing template
    ///
    /// Fails with [`StoreError::NotFound`](crate::StoreError::NotFound) if no
    /// template with the given id exists.
    async fn update_template(&self, template: &Template) -> StoreResult<()>;

    /// Delete a template by id
    async fn delete_template(&self, id: &str) -> StoreResult<()>;

    /// Load all templates
    async fn list_templates(&self) -> StoreResult<Vec<Template>>;

    /// Load all templates in the given category
    async fn list_templates_by_category(&self, category: &str) -> StoreResult<Vec<Template>>;
}

/// Store for registry variables, keyed by unique name
#[async_trait]
pub trait VariableStore: Send + Sync {
    /// Insert a new variable
    ///
    /// Fails with [`StoreError::Conflict`](crate::StoreError::Conflict) if a
    /// variable with the same name already exists.
    async fn create_variable(&self, variable: &Variable) -> StoreResult<()>;

    /// Load a variable by name
    async fn get_variable(&self, name: &str) -> StoreResult<Variable>;

    /// Look up a variable by name, returning `None` when absent
    async fn find_variable(&self, name: &str) -> StoreResult<Option<Variable>>;

    /// Replace an existing variable
    async fn update_variable(&self, variable: &Variable) -> StoreResult<()>;

    /// Delete a variable by name
    async fn delete_variable(&self, name: &str) -> StoreResult<()>;

    /// Load all variables
    async fn list_variables(&self) -> StoreResult<Vec<Variable>>;
}
