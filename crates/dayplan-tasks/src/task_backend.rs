//! Task storage backend trait and error types.
//!
//! This module defines the `TaskStore` trait that abstracts over the JSON
//! file and SQLite implementations.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

use crate::task::{Task, User};

/// Errors that can occur during task store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite connection or statement failure, passed through unchanged.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Reading or writing the backing file failed.
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The in-memory collection could not be encoded.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Database(_) => "A data operation failed. Please try again.",
            Self::Io { .. } => "Unable to save your tasks. Check disk space and permissions.",
            Self::Serialize(_) => "Unable to save your tasks. Please try again.",
        }
    }
}

/// Result type for task store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for task storage backends.
///
/// Both implementations assign ids as one past the highest id ever handed
/// out, list tasks in ascending id order, and treat toggling or deleting a
/// missing id as a no-op.
pub trait TaskStore: Send {
    /// Add a task for `date`, not done. Returns the assigned id.
    ///
    /// `text` is stored as given; rejecting empty input is the caller's job.
    fn add_task(&self, date: NaiveDate, text: &str, location: Option<&str>) -> StoreResult<i64>;

    /// Tasks for exactly `date`, in ascending id order.
    ///
    /// With a non-empty `location`, only tasks at that location or with no
    /// location are returned.
    fn list_tasks(&self, date: NaiveDate, location: Option<&str>) -> StoreResult<Vec<Task>>;

    /// Flip the done flag of task `id`.
    ///
    /// Returns whether a task matched. An unknown id changes nothing.
    fn toggle_task(&self, id: i64) -> StoreResult<bool>;

    /// Remove task `id` permanently. Returns whether a task matched.
    fn delete_task(&self, id: i64) -> StoreResult<bool>;

    /// Store a new user. Returns `None` if `username` is already taken.
    ///
    /// The password is kept exactly as supplied.
    fn add_user(&self, username: &str, password: &str) -> StoreResult<Option<i64>>;

    /// Look up a user by name.
    fn get_user(&self, username: &str) -> StoreResult<Option<User>>;
}
