//! JSON-file task storage.
//!
//! The whole collection lives in one document that is read fully on every
//! call and rewritten fully on every mutation. There is no locking: a single
//! process is assumed to own the file.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::task::{Task, User};
use crate::task_backend::{StoreError, StoreResult, TaskStore};

/// On-disk document layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    users: Vec<User>,
    /// Highest ids ever assigned; missing in files from older versions.
    #[serde(default)]
    sequence: Sequence,
}

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize)]
struct Sequence {
    #[serde(default)]
    tasks: i64,
    #[serde(default)]
    users: i64,
}

impl Document {
    fn next_task_id(&mut self) -> i64 {
        let highest = self.tasks.iter().map(|t| t.id).max().unwrap_or(0);
        self.sequence.tasks = highest.max(self.sequence.tasks) + 1;
        self.sequence.tasks
    }

    fn next_user_id(&mut self) -> i64 {
        let highest = self.users.iter().map(|u| u.id).max().unwrap_or(0);
        self.sequence.users = highest.max(self.sequence.users) + 1;
        self.sequence.users
    }
}

/// JSON-file task store.
#[derive(Debug, Clone)]
pub struct JsonTaskStore {
    path: PathBuf,
}

impl JsonTaskStore {
    /// Open the store at `path`.
    ///
    /// Creates the parent directory and an empty document if they don't exist.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let store = Self { path };
        if !store.path.exists() {
            store.save(&Document::default())?;
            tracing::debug!("Created task file: {}", store.path.display());
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, substituting empty state when the file can't be read.
    ///
    /// A missing file is expected before the first write. Anything else
    /// (unreadable, malformed) is logged; the next mutation that changes
    /// something overwrites the damaged file with the recovered state.
    fn load_or_default(&self) -> Document {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Document::default(),
            Err(e) => {
                tracing::warn!(
                    "Unreadable task file {}, starting empty: {}",
                    self.path.display(),
                    e
                );
                return Document::default();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(
                    "Malformed task file {}, starting empty: {}",
                    self.path.display(),
                    e
                );
                Document::default()
            }
        }
    }

    /// Replace the file contents with `document`.
    ///
    /// Writes to a sibling temp file first so readers never see half a document.
    fn save(&self, document: &Document) -> StoreResult<()> {
        let contents = serde_json::to_vec_pretty(document)?;
        let tmp_path = self.path.with_extension("json.tmp");

        fs::write(&tmp_path, contents).map_err(|e| StoreError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::io(&self.path, e))?;
        Ok(())
    }
}

impl TaskStore for JsonTaskStore {
    fn add_task(&self, date: NaiveDate, text: &str, location: Option<&str>) -> StoreResult<i64> {
        let mut document = self.load_or_default();
        let id = document.next_task_id();

        document.tasks.push(Task {
            id,
            task_date: date,
            text: text.to_string(),
            location: location.map(str::to_string),
            done: false,
        });
        self.save(&document)?;

        tracing::debug!("Added task {} for {}", id, date);
        Ok(id)
    }

    fn list_tasks(&self, date: NaiveDate, location: Option<&str>) -> StoreResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .load_or_default()
            .tasks
            .into_iter()
            .filter(|t| t.task_date == date && t.visible_at(location))
            .collect();
        // Hand-edited files may be out of order
        tasks.sort_by_key(|t| t.id);
        Ok(tasks)
    }

    fn toggle_task(&self, id: i64) -> StoreResult<bool> {
        let mut document = self.load_or_default();
        let Some(task) = document.tasks.iter_mut().find(|t| t.id == id) else {
            tracing::debug!("Toggle ignored, no task {}", id);
            return Ok(false);
        };

        task.done = !task.done;
        tracing::debug!("Toggled task {} (done: {})", id, task.done);
        self.save(&document)?;
        Ok(true)
    }

    fn delete_task(&self, id: i64) -> StoreResult<bool> {
        let mut document = self.load_or_default();
        let before = document.tasks.len();
        document.tasks.retain(|t| t.id != id);

        // Leave the file alone when nothing matched
        if document.tasks.len() == before {
            tracing::debug!("Delete ignored, no task {}", id);
            return Ok(false);
        }

        self.save(&document)?;
        tracing::debug!("Deleted task {}", id);
        Ok(true)
    }

    fn add_user(&self, username: &str, password: &str) -> StoreResult<Option<i64>> {
        let mut document = self.load_or_default();
        if document.users.iter().any(|u| u.username == username) {
            tracing::debug!("User {:?} already exists", username);
            return Ok(None);
        }

        let id = document.next_user_id();
        document.users.push(User {
            id,
            username: username.to_string(),
            password: password.to_string(),
        });
        self.save(&document)?;

        tracing::debug!("Added user {}", id);
        Ok(Some(id))
    }

    fn get_user(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .load_or_default()
            .users
            .into_iter()
            .find(|u| u.username == username))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use tracing_subscriber::fmt::MakeWriter;

    /// Log sink shared between the subscriber and the test.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Run `f` and return the warnings it logged.
    fn warnings_during(f: impl FnOnce()) -> String {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, f);
        let bytes = logs.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn create_test_store() -> (TempDir, JsonTaskStore) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = JsonTaskStore::open(dir.path().join("cache").join("tasks.json"))
            .expect("Failed to open store");
        (dir, store)
    }

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[test]
    fn test_open_creates_directory_and_empty_document() {
        let (_dir, store) = create_test_store();

        let contents = fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["tasks"], serde_json::json!([]));
        assert_eq!(value["users"], serde_json::json!([]));
    }

    #[test]
    fn test_open_keeps_existing_file() {
        let (_dir, store) = create_test_store();
        store.add_task(june(1), "Keep me", None).unwrap();

        let reopened = JsonTaskStore::open(store.path()).unwrap();
        assert_eq!(reopened.list_tasks(june(1), None).unwrap().len(), 1);
    }

    #[test]
    fn test_reads_file_without_sequence() {
        let (_dir, store) = create_test_store();
        fs::write(
            store.path(),
            r#"{
              "tasks": [
                {"id": 1, "task_date": "2024-06-01", "text": "Kupić mleko", "location": "Warszawa", "done": false},
                {"id": 4, "task_date": "2024-06-01", "text": "Zadzwonić", "location": null, "done": true}
              ],
              "users": [{"id": 1, "username": "ala", "password": "kot"}]
            }"#,
        )
        .unwrap();

        let tasks = store.list_tasks(june(1), Some("Warszawa")).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].text, "Kupić mleko");
        assert!(tasks[1].done);

        assert_eq!(store.add_task(june(1), "Next", None).unwrap(), 5);
        assert_eq!(store.add_user("ola", "pies").unwrap(), Some(2));
    }

    #[test]
    fn test_ids_not_reused_after_deleting_highest() {
        let (_dir, store) = create_test_store();

        let first = store.add_task(june(1), "One", None).unwrap();
        let second = store.add_task(june(1), "Two", None).unwrap();
        store.delete_task(second).unwrap();

        let third = store.add_task(june(1), "Three", None).unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(third, 3);
    }

    #[test]
    fn test_malformed_file_reads_as_empty() {
        let (_dir, store) = create_test_store();
        store.add_task(june(1), "Lost", None).unwrap();
        fs::write(store.path(), "{ not json").unwrap();

        assert!(store.list_tasks(june(1), None).unwrap().is_empty());
        assert_eq!(store.get_user("anyone").unwrap(), None);
    }

    #[test]
    fn test_malformed_file_logs_warning() {
        let (_dir, store) = create_test_store();
        fs::write(store.path(), "{ not json").unwrap();

        let logs = warnings_during(|| {
            assert!(store.list_tasks(june(1), None).unwrap().is_empty());
        });
        assert!(logs.contains("WARN"), "no warning in {:?}", logs);
        assert!(logs.contains("Malformed task file"), "{:?}", logs);
        assert!(logs.contains(&store.path().display().to_string()), "{:?}", logs);
    }

    #[test]
    fn test_unreadable_file_logs_warning() {
        let (_dir, store) = create_test_store();
        // A directory in place of the file fails to read without being missing
        fs::remove_file(store.path()).unwrap();
        fs::create_dir(store.path()).unwrap();

        let logs = warnings_during(|| {
            assert!(store.list_tasks(june(1), None).unwrap().is_empty());
        });
        assert!(logs.contains("WARN"), "no warning in {:?}", logs);
        assert!(logs.contains("Unreadable task file"), "{:?}", logs);
        assert!(logs.contains(&store.path().display().to_string()), "{:?}", logs);
    }

    #[test]
    fn test_missing_file_logs_nothing() {
        let (_dir, store) = create_test_store();
        fs::remove_file(store.path()).unwrap();

        let logs = warnings_during(|| {
            assert!(store.list_tasks(june(1), None).unwrap().is_empty());
        });
        assert_eq!(logs, "");
    }

    #[test]
    fn test_unmatched_toggle_and_delete_leave_file_untouched() {
        let (_dir, store) = create_test_store();
        let damaged = r#"{"tasks": [ {"id": 1, BROKEN"#;
        fs::write(store.path(), damaged).unwrap();

        assert!(!store.toggle_task(999).unwrap());
        assert!(!store.delete_task(999).unwrap());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), damaged);
    }

    #[test]
    fn test_matched_toggle_and_delete_are_saved() {
        let (_dir, store) = create_test_store();
        let id = store.add_task(june(1), "Flip", None).unwrap();

        assert!(store.toggle_task(id).unwrap());
        let reopened = JsonTaskStore::open(store.path()).unwrap();
        assert!(reopened.list_tasks(june(1), None).unwrap()[0].done);

        assert!(store.delete_task(id).unwrap());
        assert!(reopened.list_tasks(june(1), None).unwrap().is_empty());
    }

    // Recovery is silent: the next write replaces the damaged file and the
    // unreadable tasks are gone for good.
    #[test]
    fn test_malformed_file_is_overwritten_on_next_write() {
        let (_dir, store) = create_test_store();
        store.add_task(june(1), "Lost", None).unwrap();
        fs::write(store.path(), "[1, 2, 3]").unwrap();

        let id = store.add_task(june(1), "Fresh", None).unwrap();
        assert_eq!(id, 1);

        let tasks = store.list_tasks(june(1), None).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].text, "Fresh");
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let (_dir, store) = create_test_store();
        fs::remove_file(store.path()).unwrap();

        assert!(store.list_tasks(june(1), None).unwrap().is_empty());
        store.add_task(june(1), "Recreated", None).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_list_sorted_by_id() {
        let (_dir, store) = create_test_store();
        fs::write(
            store.path(),
            r#"{"tasks": [
                {"id": 3, "task_date": "2024-06-01", "text": "c"},
                {"id": 1, "task_date": "2024-06-01", "text": "a"},
                {"id": 2, "task_date": "2024-06-01", "text": "b"}
            ], "users": []}"#,
        )
        .unwrap();

        let ids: Vec<i64> = store.list_tasks(june(1), None).unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_file_is_pretty_printed_utf8() {
        let (_dir, store) = create_test_store();
        store.add_task(june(1), "Zażółć gęślą jaźń", Some("Łódź")).unwrap();

        let contents = fs::read_to_string(store.path()).unwrap();
        assert!(contents.contains("Zażółć gęślą jaźń"));
        assert!(contents.contains('\n'));
        assert!(!store.path().with_extension("json.tmp").exists());
    }
}
