//! Task storage for Dayplan
//!
//! Date-scoped text tasks behind one `TaskStore` trait, with a JSON-file and
//! a SQLite implementation. The backend is picked once, at startup, through
//! [`open_store`].

pub mod json_store;
pub mod sqlite_store;
pub mod task;
pub mod task_backend;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub use json_store::JsonTaskStore;
pub use sqlite_store::SqliteTaskStore;
pub use task::{Task, User};
pub use task_backend::{StoreError, StoreResult, TaskStore};

/// Which storage implementation backs the task collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Json,
    Sqlite,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Open the configured backend at `path`.
///
/// # Errors
/// Returns `StoreError` if the file, its directory or the schema can't be created.
pub fn open_store<P: AsRef<Path>>(
    backend: StorageBackend,
    path: P,
) -> StoreResult<Box<dyn TaskStore>> {
    let path = path.as_ref();
    tracing::info!("Opening {} task store at {}", backend, path.display());

    Ok(match backend {
        StorageBackend::Json => Box::new(JsonTaskStore::open(path)?),
        StorageBackend::Sqlite => Box::new(SqliteTaskStore::open(path)?),
    })
}
