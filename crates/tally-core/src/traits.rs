use crate::{
    error::TallyError,
    notification::{NotificationPayload, TriggerHandle},
    task::TaskRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Persistent Store trait: the host platform's key-value storage.
///
/// One string key maps to one string value (here: the JSON task array).
/// The engine never assumes anything about durability beyond get/set.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value at `key`, `None` if the key has never been written.
    async fn get(&self, key: &str) -> Result<Option<String>, TallyError>;

    /// Write `value` at `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), TallyError>;
}

/// Values the remote create endpoint may hand back. They are only used to
/// pick default field values for the locally stored task, never the id.
#[derive(Debug, Clone, Default)]
pub struct RemoteDefaults {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub user_id: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Remote task source: the demo REST API behind the seed-once policy.
///
/// Consulted only when the local store is empty (`fetch_tasks`) and,
/// best-effort, on create (`create_task`). Update and delete have no remote
/// counterpart by design.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch the single-user task collection (one page, owner-scoped).
    async fn fetch_tasks(&self) -> Result<Vec<TaskRecord>, TallyError>;

    /// Announce a new task upstream. The response only informs local field
    /// defaults.
    async fn create_task(
        &self,
        title: &str,
        completed: bool,
        user_id: i64,
    ) -> Result<RemoteDefaults, TallyError>;
}

/// Platform notification facility, modeled as an injected capability, never a concrete
/// platform API. Registration requires externally granted permission.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Whether notifications may be registered at all.
    async fn request_permission(&self) -> Result<bool, TallyError>;

    /// Register a point-in-time trigger. The returned handle is the only way
    /// to address the trigger afterwards; firing is owned by the platform.
    async fn schedule(
        &self,
        at: DateTime<Utc>,
        payload: NotificationPayload,
    ) -> Result<TriggerHandle, TallyError>;

    /// Cancel a previously registered trigger.
    async fn cancel(&self, handle: TriggerHandle) -> Result<(), TallyError>;
}
