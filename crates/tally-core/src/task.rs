use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Owner id applied when a record carries none (single-user system; the
/// field exists for remote-API shape compatibility).
pub const DEFAULT_USER_ID: i64 = 1;

/// A task as persisted and as exchanged with the remote API (camelCase JSON).
///
/// `title` stays optional at this layer: remote payloads and older stored
/// data may lack it entirely, and that absence must survive round trips
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskRecord {
    /// Generated stand-in title for records that never had one.
    pub fn placeholder_title(id: i64) -> String {
        format!("Task {id}")
    }

    /// True when the title is present and non-blank after trimming.
    /// Records failing this are hidden from listings but kept in storage.
    pub fn has_usable_title(&self) -> bool {
        self.title
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }

    /// Convert into the domain shape, substituting the placeholder when the
    /// title is absent.
    pub fn into_task(self) -> Task {
        let title = self
            .title
            .unwrap_or_else(|| Self::placeholder_title(self.id));
        Task {
            id: self.id,
            title,
            completed: self.completed,
            user_id: self.user_id,
            due_date: self.due_date,
        }
    }
}

/// A task as handed to callers: the title is always present.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub completed: bool,
    pub user_id: i64,
    pub due_date: Option<DateTime<Utc>>,
}

impl From<Task> for TaskRecord {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: Some(task.title),
            completed: task.completed,
            user_id: task.user_id,
            due_date: task.due_date,
        }
    }
}

/// Input to `Repository::create`. Only the title is required; the rest
/// default at creation time (`completed = false`, `user_id = 1`,
/// `due_date = now`).
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub completed: Option<bool>,
    pub user_id: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

fn default_user_id() -> i64 {
    DEFAULT_USER_ID
}
