//! Task command handlers: list, add, done/reopen, edit, rm.

use super::App;
use chrono::{DateTime, Datelike, Local, NaiveDateTime, TimeZone, Utc};
use console::style;
use tally_core::error::TallyError;
use tally_core::task::{Task, TaskDraft};

impl App {
    pub async fn list(&self, all: bool) -> Result<String, TallyError> {
        let tasks = self.cached_list().await?;
        let shown: Vec<&Task> = tasks.iter().filter(|t| all || !t.completed).collect();
        if shown.is_empty() {
            return Ok("No tasks.".to_string());
        }
        let mut out = String::new();
        for task in shown {
            out.push_str(&format_task_line(task));
            out.push('\n');
        }
        out.pop();
        Ok(out)
    }

    pub async fn add(&self, title: &str, due: Option<&str>) -> Result<String, TallyError> {
        let due_date = due.map(parse_due).transpose()?;
        let task = self
            .repository
            .create(TaskDraft {
                title: title.to_string(),
                due_date,
                ..TaskDraft::default()
            })
            .await?;
        self.cache.invalidate(super::TASKS_KEY).await;
        Ok(format!("Added [{}] {}", task.id, task.title))
    }

    pub async fn set_completed(&self, id: i64, completed: bool) -> Result<String, TallyError> {
        self.repository.toggle_complete(id, completed).await?;
        self.cache.invalidate(super::TASKS_KEY).await;
        Ok(if completed {
            format!("Done [{id}]")
        } else {
            format!("Reopened [{id}]")
        })
    }

    pub async fn edit(
        &self,
        id: i64,
        title: Option<&str>,
        due: Option<&str>,
    ) -> Result<String, TallyError> {
        let tasks = self.repository.list().await?;
        let Some(mut task) = tasks.into_iter().find(|t| t.id == id) else {
            return Ok(format!("No task with id {id}"));
        };

        if let Some(t) = title {
            if t.trim().is_empty() {
                return Err(TallyError::InvalidInput("title must not be empty".into()));
            }
            task.title = t.trim().to_string();
        }
        if let Some(d) = due {
            task.due_date = Some(parse_due(d)?);
        }

        self.repository.update(&task).await?;
        self.cache.invalidate(super::TASKS_KEY).await;
        Ok(format!("Updated [{}] {}", task.id, task.title))
    }

    pub async fn remove(&self, ids: &[i64]) -> Result<String, TallyError> {
        self.repository.delete(ids).await?;
        self.cache.invalidate(super::TASKS_KEY).await;
        Ok(format!("Deleted {} task(s)", ids.len()))
    }
}

/// One listing line: checkmark, id, title, optional dimmed due date.
fn format_task_line(task: &Task) -> String {
    let mark = if task.completed {
        style("x").green().to_string()
    } else {
        " ".to_string()
    };
    let due = task
        .due_date
        .map(|d| format!("  {}", style(format_due(d)).dim()))
        .unwrap_or_default();
    format!("[{mark}] {}  {}{due}", style(task.id).cyan(), task.title)
}

/// Short human form of a due timestamp in local time, omitting the year
/// when it is the current one.
pub(super) fn format_due(due: DateTime<Utc>) -> String {
    let local = due.with_timezone(&Local);
    if local.year() == Local::now().year() {
        local.format("%m-%d %H:%M").to_string()
    } else {
        local.format("%Y-%m-%d %H:%M").to_string()
    }
}

/// Accept RFC 3339 or a local "YYYY-MM-DD HH:MM".
pub(super) fn parse_due(input: &str) -> Result<DateTime<Utc>, TallyError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M").map_err(|_| {
        TallyError::InvalidInput(format!(
            "unrecognized due date '{input}' (use RFC 3339 or \"YYYY-MM-DD HH:MM\")"
        ))
    })?;
    match Local.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) | chrono::LocalResult::Ambiguous(dt, _) => {
            Ok(dt.with_timezone(&Utc))
        }
        chrono::LocalResult::None => Err(TallyError::InvalidInput(format!(
            "due date '{input}' does not exist in local time"
        ))),
    }
}
