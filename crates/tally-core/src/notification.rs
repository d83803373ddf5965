use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque handle for a registered notification trigger. Minted by the
/// notification facility; only useful for later cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerHandle(pub Uuid);

impl TriggerHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TriggerHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Content of a point-in-time notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Short heading (e.g. "To-Do Reminder").
    pub title: String,
    /// Message body (e.g. "\"Buy milk\" is due in 5 minutes").
    pub body: String,
}
