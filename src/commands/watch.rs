//! Foreground reminder delivery loop.

use super::App;
use crate::notify::TerminalNotifier;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tally_core::error::TallyError;
use tally_notify::{ReminderScheduler, ScheduleOutcome, SystemClock};
use tracing::{info, warn};

impl App {
    /// Poll the repository and keep reminder triggers registered for every
    /// open task with a due date. Runs until interrupted.
    pub async fn watch(&self) -> Result<(), TallyError> {
        if !self.config.reminder.enabled {
            return Err(TallyError::Config(
                "reminders are disabled in config".into(),
            ));
        }

        let scheduler = ReminderScheduler::new(
            Arc::new(TerminalNotifier::new()),
            Arc::new(SystemClock),
            self.config.reminder.lead_minutes,
        );
        let poll = Duration::from_secs(self.config.reminder.poll_interval_secs);
        info!("watching for reminders every {}s", poll.as_secs());

        // Due date last scheduled per task, to re-register on change.
        let mut scheduled: HashMap<i64, DateTime<Utc>> = HashMap::new();

        loop {
            match self.repository.list().await {
                Ok(tasks) => {
                    for task in &tasks {
                        if task.completed {
                            if scheduled.remove(&task.id).is_some() {
                                scheduler.cancel_for_task(task.id).await;
                            }
                            continue;
                        }
                        let Some(due) = task.due_date else { continue };
                        if scheduled.get(&task.id) == Some(&due) {
                            continue;
                        }
                        match scheduler.schedule(task.id, &task.title, due).await {
                            ScheduleOutcome::PermissionDenied => {
                                warn!("notification permission not granted")
                            }
                            ScheduleOutcome::Registered { lead, due: at_due } => {
                                if lead || at_due {
                                    info!(
                                        "reminders registered for [{}] {}",
                                        task.id, task.title
                                    );
                                }
                                scheduled.insert(task.id, due);
                            }
                        }
                    }

                    // Forget triggers of tasks that were deleted meanwhile.
                    let known: Vec<i64> = scheduled.keys().copied().collect();
                    for id in known {
                        if !tasks.iter().any(|t| t.id == id) {
                            scheduled.remove(&id);
                            scheduler.cancel_for_task(id).await;
                        }
                    }
                }
                Err(e) => warn!("watch: failed to list tasks: {e}"),
            }
            tokio::time::sleep(poll).await;
        }
    }
}
