//! SQLite-based task storage implementation.
//!
//! Every operation opens its own connection, runs a single statement in
//! autocommit mode and closes the connection again. Nothing is pooled and no
//! transaction spans two operations.

use chrono::NaiveDate;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};

use crate::task::{location_filter, Task, User};
use crate::task_backend::{StoreError, StoreResult, TaskStore};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        task_date TEXT NOT NULL,
        text TEXT NOT NULL,
        location TEXT NULL,
        done INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_tasks_date ON tasks(task_date);
"#;

/// SQLite-based task storage.
#[derive(Debug, Clone)]
pub struct SqliteTaskStore {
    path: PathBuf,
}

impl SqliteTaskStore {
    /// Open a task store at the given path.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let store = Self { path };
        store.connect()?.execute_batch(SCHEMA)?;
        tracing::debug!("Opened task database: {}", store.path.display());
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> StoreResult<Connection> {
        Ok(Connection::open(&self.path)?)
    }

    /// Convert a database row to a Task.
    fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
        let done: i32 = row.get(4)?;
        Ok(Task {
            id: row.get(0)?,
            task_date: row.get(1)?,
            text: row.get(2)?,
            location: row.get(3)?,
            done: done != 0,
        })
    }
}

impl TaskStore for SqliteTaskStore {
    fn add_task(&self, date: NaiveDate, text: &str, location: Option<&str>) -> StoreResult<i64> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO tasks (task_date, text, location, done) VALUES (?1, ?2, ?3, 0)",
            params![date, text, location],
        )?;

        let id = conn.last_insert_rowid();
        tracing::debug!("Added task {} for {}", id, date);
        Ok(id)
    }

    fn list_tasks(&self, date: NaiveDate, location: Option<&str>) -> StoreResult<Vec<Task>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, task_date, text, location, done
             FROM tasks
             WHERE task_date = ?1
               AND (?2 IS NULL OR location = ?2 OR location IS NULL)
             ORDER BY id",
        )?;

        let rows = stmt.query_map(params![date, location_filter(location)], Self::row_to_task)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn toggle_task(&self, id: i64) -> StoreResult<bool> {
        let changed = self
            .connect()?
            .execute("UPDATE tasks SET done = NOT done WHERE id = ?1", params![id])?;

        tracing::debug!("Toggled task {} ({} row(s))", id, changed);
        Ok(changed > 0)
    }

    fn delete_task(&self, id: i64) -> StoreResult<bool> {
        let changed = self
            .connect()?
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])?;

        tracing::debug!("Deleted task {} ({} row(s))", id, changed);
        Ok(changed > 0)
    }

    fn add_user(&self, username: &str, password: &str) -> StoreResult<Option<i64>> {
        let conn = self.connect()?;
        let inserted = conn.execute(
            "INSERT INTO users (username, password) VALUES (?1, ?2)",
            params![username, password],
        );

        match inserted {
            Ok(_) => {
                let id = conn.last_insert_rowid();
                tracing::debug!("Added user {}", id);
                Ok(Some(id))
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                tracing::debug!("User {:?} already exists", username);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_user(&self, username: &str) -> StoreResult<Option<User>> {
        let user = self
            .connect()?
            .query_row(
                "SELECT id, username, password FROM users WHERE username = ?1",
                params![username],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }
}
