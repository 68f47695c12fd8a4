//! Persistence boundary for PromptLab
//!
//! This crate provides a unified interface for storing templates and
//! registry variables across different backends:
//!
//! - **Memory store**: `tokio::sync::RwLock`-backed maps, the default for
//!   tests and embedded use
//! - **File system store**: one YAML document per record on disk, with
//!   legacy records migrated at load time
//!
//! Per-record atomicity only; no cross-record transaction semantics are
//! assumed. Store failures are the one error class that propagates as a hard
//! failure to callers.
//!
//! # Quick Start
//!
//! ```no_run
//! use promptlab_core::Template;
//! use promptlab_store::{FileSystemStore, TemplateStore};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let store = FileSystemStore::new("data")?;
//!
//! let template = Template::new("t1", "Role play", "Act as {role}");
//! store.create_template(&template).await?;
//!
//! let loaded = store.get_template("t1").await?;
//! assert_eq!(loaded.text, "Act as {role}");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod file_system;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file_system::FileSystemStore;
pub use memory::MemoryStore;
pub use traits::{TemplateStore, VariableStore};
