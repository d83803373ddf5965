//! Trigger computation and registration against the notification facility.

use crate::clock::Clock;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tally_core::notification::{NotificationPayload, TriggerHandle};
use tally_core::traits::Notifier;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// What `schedule` did, for the caller to surface. Deliberately not a
/// `Result`: reminder failures must never roll back the task mutation that
/// triggered them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// Notification permission is not granted; nothing was registered.
    PermissionDenied,
    /// Registration ran; the flags say which triggers are now pending.
    Registered { lead: bool, due: bool },
}

/// Computes and registers the reminder pair for a task: one trigger a few
/// minutes ahead of the due time and one at the due time itself. Triggers
/// are keyed by task id so an update supersedes only that task's pair.
pub struct ReminderScheduler {
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    lead: Duration,
    handles: Mutex<HashMap<i64, Vec<TriggerHandle>>>,
}

impl ReminderScheduler {
    pub fn new(notifier: Arc<dyn Notifier>, clock: Arc<dyn Clock>, lead_minutes: i64) -> Self {
        Self {
            notifier,
            clock,
            lead: Duration::minutes(lead_minutes),
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Register the reminder pair for one task, superseding whatever was
    /// registered for that task before. Zero, one, or both triggers land
    /// depending on how far in the future `due_at` is.
    pub async fn schedule(
        &self,
        task_id: i64,
        title: &str,
        due_at: DateTime<Utc>,
    ) -> ScheduleOutcome {
        match self.notifier.request_permission().await {
            Ok(true) => {}
            Ok(false) => {
                debug!("reminders for task {task_id} skipped: permission not granted");
                return ScheduleOutcome::PermissionDenied;
            }
            Err(e) => {
                warn!("permission check failed, skipping reminders for task {task_id}: {e}");
                return ScheduleOutcome::PermissionDenied;
            }
        }

        self.cancel_for_task(task_id).await;

        let now = self.clock.now();
        let lead_at = due_at - self.lead;
        let mut registered = Vec::new();
        let mut lead = false;
        let mut due = false;

        if lead_at > now {
            let payload = NotificationPayload {
                title: "To-Do Reminder".into(),
                body: format!(
                    "\"{title}\" is due in {} minutes",
                    self.lead.num_minutes()
                ),
            };
            match self.notifier.schedule(lead_at, payload).await {
                Ok(handle) => {
                    registered.push(handle);
                    lead = true;
                }
                Err(e) => warn!("failed to register lead trigger for task {task_id}: {e}"),
            }
        }

        if due_at > now {
            let payload = NotificationPayload {
                title: "To-Do Due".into(),
                body: format!("\"{title}\" is now due"),
            };
            match self.notifier.schedule(due_at, payload).await {
                Ok(handle) => {
                    registered.push(handle);
                    due = true;
                }
                Err(e) => warn!("failed to register due trigger for task {task_id}: {e}"),
            }
        }

        if !registered.is_empty() {
            self.handles.lock().await.insert(task_id, registered);
        }
        ScheduleOutcome::Registered { lead, due }
    }

    /// Cancel and forget the pending triggers of one task. Cancel failures
    /// are logged and swallowed; the platform may already have fired them.
    pub async fn cancel_for_task(&self, task_id: i64) {
        let handles = self.handles.lock().await.remove(&task_id);
        for handle in handles.into_iter().flatten() {
            if let Err(e) = self.notifier.cancel(handle).await {
                warn!("failed to cancel trigger for task {task_id}: {e}");
            }
        }
    }
}
