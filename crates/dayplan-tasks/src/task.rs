//! Task and user records shared by every storage backend.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A date-scoped text reminder with a completion flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    /// Serialized as `YYYY-MM-DD`
    pub task_date: NaiveDate,
    pub text: String,
    /// `None` means the task shows up under every location filter.
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub done: bool,
}

impl Task {
    /// Whether this task belongs in a listing filtered by `location`.
    ///
    /// No filter (or an empty one) matches everything. Otherwise the task
    /// must carry the same location or none at all.
    pub fn visible_at(&self, location: Option<&str>) -> bool {
        match location_filter(location) {
            None => true,
            Some(wanted) => self.location.as_deref().map_or(true, |own| own == wanted),
        }
    }
}

/// A stored account. Not used by any login flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
}

/// Normalize a location filter: an empty string means no filter.
pub(crate) fn location_filter(location: Option<&str>) -> Option<&str> {
    location.filter(|l| !l.is_empty())
}
