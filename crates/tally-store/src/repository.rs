//! The task repository: the canonical task list, local-first with
//! opportunistic remote seeding.
//!
//! The persisted store is the sole source of truth once populated; the
//! remote is consulted only while the store has never been written
//! ("seed once", not a sync policy). All mutations are plain
//! read-modify-write against the single tasks key.

use chrono::Utc;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use tally_core::config::CreatePolicy;
use tally_core::error::TallyError;
use tally_core::task::{Task, TaskDraft, TaskRecord, DEFAULT_USER_ID};
use tally_core::traits::{KeyValueStore, RemoteDefaults, RemoteSource};
use tracing::{info, warn};

/// Owns create/read/update/delete over the stored task collection.
pub struct Repository {
    store: Arc<dyn KeyValueStore>,
    remote: Option<Arc<dyn RemoteSource>>,
    tasks_key: String,
    create_policy: CreatePolicy,
}

impl Repository {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        remote: Option<Arc<dyn RemoteSource>>,
        tasks_key: impl Into<String>,
        create_policy: CreatePolicy,
    ) -> Self {
        Self {
            store,
            remote,
            tasks_key: tasks_key.into(),
            create_policy,
        }
    }

    /// List tasks. Never touches the network once the store is populated.
    /// Records with a blank title are hidden from the result but stay in
    /// storage untouched.
    pub async fn list(&self) -> Result<Vec<Task>, TallyError> {
        let records = self.load_or_seed().await?;
        Ok(records
            .into_iter()
            .filter(|r| r.has_usable_title())
            .map(TaskRecord::into_task)
            .collect())
    }

    /// Create a task: validate the title, announce it upstream (per the
    /// configured policy), assign a collision-free id, and append to the
    /// stored collection.
    pub async fn create(&self, draft: TaskDraft) -> Result<Task, TallyError> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(TallyError::InvalidInput("title must not be empty".into()));
        }

        let completed = draft.completed.unwrap_or(false);
        let user_id = draft.user_id.unwrap_or(DEFAULT_USER_ID);

        // The remote response only informs field defaults, never the id.
        let mut defaults = RemoteDefaults::default();
        if let Some(remote) = &self.remote {
            match remote.create_task(&title, completed, user_id).await {
                Ok(d) => defaults = d,
                Err(e) => match self.create_policy {
                    CreatePolicy::Required => return Err(e),
                    CreatePolicy::BestEffort => {
                        warn!("remote add failed, creating locally only: {e}");
                    }
                },
            }
        }

        let mut records = self.load_raw().await?.unwrap_or_default();
        let id = fresh_id(&records);

        let record = TaskRecord {
            id,
            title: Some(defaults.title.filter(|t| !t.is_empty()).unwrap_or(title)),
            completed: defaults.completed.unwrap_or(completed),
            user_id: defaults.user_id.unwrap_or(user_id),
            due_date: Some(defaults.due_date.or(draft.due_date).unwrap_or_else(Utc::now)),
        };
        records.push(record.clone());
        self.write_all(&records).await?;

        Ok(record.into_task())
    }

    /// Replace the entry matching `task.id`, leaving every other record
    /// untouched. A missing id is a silent no-op, not an error. Loads with
    /// `list()` semantics, so an empty store seeds first.
    pub async fn update(&self, task: &Task) -> Result<Task, TallyError> {
        let mut records = self.load_or_seed().await?;
        for r in records.iter_mut() {
            if r.id == task.id {
                *r = TaskRecord::from(task.clone());
            }
        }
        self.write_all(&records).await?;
        Ok(task.clone())
    }

    /// Flip one completion flag in place, cheaply. Reads the stored
    /// collection raw (no dedup, no placeholders) and writes it back as-is.
    /// An absent store or missing id is a no-op.
    pub async fn toggle_complete(&self, id: i64, completed: bool) -> Result<(), TallyError> {
        let Some(mut records) = self.load_raw().await? else {
            return Ok(());
        };
        for r in records.iter_mut() {
            if r.id == id {
                r.completed = completed;
            }
        }
        self.write_all(&records).await
    }

    /// Batch delete: one read, one filter over the whole id set, one write.
    /// Ids not present among the others are ignored; an absent store is the
    /// only failure.
    pub async fn delete(&self, ids: &[i64]) -> Result<(), TallyError> {
        let Some(records) = self.load_raw().await? else {
            return Err(TallyError::NotFound("no tasks in local storage".into()));
        };
        let remaining: Vec<TaskRecord> = records
            .into_iter()
            .filter(|r| !ids.contains(&r.id))
            .collect();
        self.write_all(&remaining).await
    }

    /// Parse the stored payload without any normalization. `None` means the
    /// key has never been written.
    async fn load_raw(&self) -> Result<Option<Vec<TaskRecord>>, TallyError> {
        match self.store.get(&self.tasks_key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Load the normalized collection, seeding from the remote exactly once
    /// when the store has never been written. The local path never writes.
    async fn load_or_seed(&self) -> Result<Vec<TaskRecord>, TallyError> {
        if let Some(records) = self.load_raw().await? {
            let mut records = dedup_by_id(records);
            fill_missing_titles(&mut records);
            return Ok(records);
        }

        let Some(remote) = &self.remote else {
            // Leave the key unwritten so a later-enabled remote still seeds.
            return Ok(Vec::new());
        };
        let mut records = remote.fetch_tasks().await?;
        normalize_seed_titles(&mut records);
        self.write_all(&records).await?;
        info!("seeded {} tasks from remote", records.len());
        Ok(records)
    }

    async fn write_all(&self, records: &[TaskRecord]) -> Result<(), TallyError> {
        let payload = serde_json::to_string(records)?;
        self.store.set(&self.tasks_key, &payload).await
    }
}

/// De-duplicate by id: the last occurrence in load order wins and keeps its
/// position.
pub(crate) fn dedup_by_id(records: Vec<TaskRecord>) -> Vec<TaskRecord> {
    let mut seen = HashSet::new();
    let mut out: Vec<TaskRecord> = records
        .into_iter()
        .rev()
        .filter(|r| seen.insert(r.id))
        .collect();
    out.reverse();
    out
}

/// Substitute the generated placeholder for records that have no title at
/// all. Blank-but-present titles are left alone; they stay hidden from
/// listings without being rewritten.
pub(crate) fn fill_missing_titles(records: &mut [TaskRecord]) {
    for r in records.iter_mut() {
        if r.title.is_none() {
            r.title = Some(TaskRecord::placeholder_title(r.id));
        }
    }
}

/// Seed-path normalization: bake the placeholder into records that arrive
/// with no title (or an empty one) before persisting them.
pub(crate) fn normalize_seed_titles(records: &mut [TaskRecord]) {
    for r in records.iter_mut() {
        if r.title.as_deref().map_or(true, |t| t.is_empty()) {
            r.title = Some(TaskRecord::placeholder_title(r.id));
        }
    }
}

/// Assign an id nobody currently holds: millisecond timestamp plus a small
/// random offset, resampled until unique among the stored ids.
fn fresh_id(records: &[TaskRecord]) -> i64 {
    let existing: HashSet<i64> = records.iter().map(|r| r.id).collect();
    let mut rng = rand::thread_rng();
    fresh_id_from(&existing, || {
        Utc::now().timestamp_millis() + rng.gen_range(0..1000)
    })
}

/// Collision-avoidance loop over a candidate generator. Tolerates an empty
/// id set and terminates as soon as the generator leaves the set.
fn fresh_id_from(existing: &HashSet<i64>, mut candidate: impl FnMut() -> i64) -> i64 {
    loop {
        let id = candidate();
        if !existing.contains(&id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests;
