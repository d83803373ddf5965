use super::*;
use crate::kv::MemoryStore;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use tally_core::traits::{KeyValueStore, RemoteDefaults, RemoteSource};

const KEY: &str = "@todos";

/// Remote fake: serves a fixed seed payload, scripted add behavior, and
/// counts fetches.
#[derive(Default)]
struct FakeRemote {
    seed: Vec<TaskRecord>,
    fetch_fails: bool,
    fetch_calls: AtomicUsize,
    add_fails: bool,
    add_defaults: RemoteDefaults,
}

#[async_trait]
impl RemoteSource for FakeRemote {
    async fn fetch_tasks(&self) -> Result<Vec<TaskRecord>, TallyError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fetch_fails {
            return Err(TallyError::Remote("seed returned 500 Internal Server Error".into()));
        }
        Ok(self.seed.clone())
    }

    async fn create_task(
        &self,
        _title: &str,
        _completed: bool,
        _user_id: i64,
    ) -> Result<RemoteDefaults, TallyError> {
        if self.add_fails {
            return Err(TallyError::Remote("add returned 500: Add failed".into()));
        }
        Ok(self.add_defaults.clone())
    }
}

/// Store fake whose reads and writes always fail.
struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, TallyError> {
        Err(TallyError::Storage("kv get failed: disk offline".into()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), TallyError> {
        Err(TallyError::Storage("kv set failed: disk offline".into()))
    }
}

fn record(id: i64, title: Option<&str>) -> TaskRecord {
    TaskRecord {
        id,
        title: title.map(str::to_string),
        completed: false,
        user_id: 1,
        due_date: None,
    }
}

/// Repository over a fresh in-memory store, no remote.
fn local_repo() -> (Arc<MemoryStore>, Repository) {
    let store = Arc::new(MemoryStore::new());
    let repo = Repository::new(store.clone(), None, KEY, CreatePolicy::BestEffort);
    (store, repo)
}

fn remote_repo(remote: FakeRemote, policy: CreatePolicy) -> (Arc<MemoryStore>, Arc<FakeRemote>, Repository) {
    let store = Arc::new(MemoryStore::new());
    let remote = Arc::new(remote);
    let repo = Repository::new(store.clone(), Some(remote.clone()), KEY, policy);
    (store, remote, repo)
}

async fn raw_payload(store: &MemoryStore) -> Option<String> {
    store.get(KEY).await.unwrap()
}

// --- create / list ---

#[tokio::test]
async fn test_create_then_list_round_trip() {
    let (_store, repo) = local_repo();
    let due: DateTime<Utc> = Utc::now() + Duration::hours(2);

    let created = repo
        .create(TaskDraft {
            title: "  Buy milk  ".into(),
            due_date: Some(due),
            ..TaskDraft::default()
        })
        .await
        .unwrap();

    let tasks = repo.list().await.unwrap();
    assert_eq!(tasks.len(), 1);
    let task = &tasks[0];
    assert_eq!(task.id, created.id);
    assert_eq!(task.title, "Buy milk");
    assert!(!task.completed);
    assert_eq!(task.user_id, 1);
    assert_eq!(task.due_date, Some(due));
}

#[tokio::test]
async fn test_create_ids_pairwise_distinct() {
    let (_store, repo) = local_repo();
    let mut ids = HashSet::new();
    for i in 0..20 {
        let task = repo.create(TaskDraft::new(format!("task {i}"))).await.unwrap();
        assert!(ids.insert(task.id), "id {} repeated", task.id);
    }
}

#[tokio::test]
async fn test_create_rejects_blank_title() {
    let (store, repo) = local_repo();
    for title in ["", "   ", "\t\n"] {
        let err = repo.create(TaskDraft::new(title)).await.unwrap_err();
        assert!(matches!(err, TallyError::InvalidInput(_)));
    }
    // Nothing was ever persisted.
    assert!(raw_payload(&store).await.is_none());
}

#[tokio::test]
async fn test_create_defaults_due_date_to_now() {
    let (_store, repo) = local_repo();
    let before = Utc::now();
    let task = repo.create(TaskDraft::new("no due")).await.unwrap();
    let due = task.due_date.expect("due date defaulted");
    assert!(due >= before && due <= Utc::now());
}

// --- toggle complete ---

#[tokio::test]
async fn test_toggle_complete_flips_only_that_flag() {
    let (_store, repo) = local_repo();
    let a = repo.create(TaskDraft::new("a")).await.unwrap();
    let b = repo.create(TaskDraft::new("b")).await.unwrap();

    repo.toggle_complete(a.id, true).await.unwrap();

    let tasks = repo.list().await.unwrap();
    let got_a = tasks.iter().find(|t| t.id == a.id).unwrap();
    let got_b = tasks.iter().find(|t| t.id == b.id).unwrap();
    assert!(got_a.completed);
    assert_eq!(got_a.title, a.title);
    assert_eq!(got_a.due_date, a.due_date);
    assert_eq!(got_b, &b);
}

#[tokio::test]
async fn test_toggle_missing_id_is_noop() {
    let (_store, repo) = local_repo();
    let a = repo.create(TaskDraft::new("a")).await.unwrap();
    repo.toggle_complete(a.id + 1, true).await.unwrap();
    let tasks = repo.list().await.unwrap();
    assert!(!tasks[0].completed);
}

#[tokio::test]
async fn test_toggle_on_absent_store_is_noop() {
    let (store, repo) = local_repo();
    repo.toggle_complete(1, true).await.unwrap();
    assert!(raw_payload(&store).await.is_none());
}

// --- delete ---

#[tokio::test]
async fn test_batch_delete_under_one_snapshot() {
    let (_store, repo) = local_repo();
    let a = repo.create(TaskDraft::new("a")).await.unwrap();
    let b = repo.create(TaskDraft::new("b")).await.unwrap();
    let c = repo.create(TaskDraft::new("c")).await.unwrap();

    repo.delete(&[a.id, c.id]).await.unwrap();

    let tasks = repo.list().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0], b);
}

#[tokio::test]
async fn test_delete_unknown_id_is_idempotent() {
    let (_store, repo) = local_repo();
    let a = repo.create(TaskDraft::new("a")).await.unwrap();

    repo.delete(&[a.id + 1]).await.unwrap();
    repo.delete(&[a.id + 1]).await.unwrap();

    let tasks = repo.list().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, a.id);
}

#[tokio::test]
async fn test_delete_on_absent_store_is_not_found() {
    let (_store, repo) = local_repo();
    let err = repo.delete(&[1]).await.unwrap_err();
    assert!(matches!(err, TallyError::NotFound(_)));
}

// --- update ---

#[tokio::test]
async fn test_update_replaces_single_entry() {
    let (_store, repo) = local_repo();
    let a = repo.create(TaskDraft::new("a")).await.unwrap();
    let b = repo.create(TaskDraft::new("b")).await.unwrap();

    let mut edited = a.clone();
    edited.title = "a, edited".into();
    edited.due_date = Some(Utc::now() + Duration::days(1));
    repo.update(&edited).await.unwrap();

    let tasks = repo.list().await.unwrap();
    let got_a = tasks.iter().find(|t| t.id == a.id).unwrap();
    let got_b = tasks.iter().find(|t| t.id == b.id).unwrap();
    assert_eq!(got_a, &edited);
    assert_eq!(got_b, &b);
}

#[tokio::test]
async fn test_update_missing_id_is_silent_noop() {
    let (_store, repo) = local_repo();
    let a = repo.create(TaskDraft::new("a")).await.unwrap();

    let ghost = Task {
        id: a.id + 1,
        title: "ghost".into(),
        completed: false,
        user_id: 1,
        due_date: None,
    };
    repo.update(&ghost).await.unwrap();

    let tasks = repo.list().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, a.id);
}

// --- seeding ---

#[tokio::test]
async fn test_seed_once_then_local_is_authoritative() {
    let remote = FakeRemote {
        seed: vec![record(1, Some("from remote")), record(2, None)],
        ..FakeRemote::default()
    };
    let (store, remote, repo) = remote_repo(remote, CreatePolicy::BestEffort);

    let first = repo.list().await.unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[1].title, "Task 2");
    assert_eq!(remote.fetch_calls.load(Ordering::SeqCst), 1);

    // The placeholder was baked into the persisted payload on the seed path.
    let payload = raw_payload(&store).await.unwrap();
    assert!(payload.contains("Task 2"));

    // Subsequent reads never touch the network.
    repo.list().await.unwrap();
    repo.list().await.unwrap();
    assert_eq!(remote.fetch_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_seed_failure_surfaces_remote_error() {
    let remote = FakeRemote {
        fetch_fails: true,
        ..FakeRemote::default()
    };
    let (store, _remote, repo) = remote_repo(remote, CreatePolicy::BestEffort);

    let err = repo.list().await.unwrap_err();
    assert!(matches!(err, TallyError::Remote(_)));
    assert!(raw_payload(&store).await.is_none());
}

#[tokio::test]
async fn test_empty_store_without_remote_lists_empty() {
    let (store, repo) = local_repo();
    assert!(repo.list().await.unwrap().is_empty());
    // Key stays unwritten so a later-enabled remote can still seed.
    assert!(raw_payload(&store).await.is_none());
}

// --- normalization on the local path ---

#[tokio::test]
async fn test_dedup_last_occurrence_wins_and_keeps_position() {
    let (store, repo) = local_repo();
    let stored = serde_json::to_string(&vec![
        record(1, Some("first copy")),
        record(2, Some("middle")),
        record(1, Some("last copy")),
    ])
    .unwrap();
    store.set(KEY, &stored).await.unwrap();

    let tasks = repo.list().await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].id, 2);
    assert_eq!(tasks[1].id, 1);
    assert_eq!(tasks[1].title, "last copy");
}

#[tokio::test]
async fn test_absent_title_gets_placeholder_without_rewrite() {
    let (store, repo) = local_repo();
    let stored = serde_json::to_string(&vec![record(5, None)]).unwrap();
    store.set(KEY, &stored).await.unwrap();

    let tasks = repo.list().await.unwrap();
    assert_eq!(tasks[0].title, "Task 5");

    // Reading is not a mutation: the stored payload is untouched.
    assert_eq!(raw_payload(&store).await.unwrap(), stored);
}

#[tokio::test]
async fn test_blank_title_hidden_but_survives_mutations() {
    let (store, repo) = local_repo();
    let stored = serde_json::to_string(&vec![
        record(1, Some("visible")),
        record(2, Some("   ")),
    ])
    .unwrap();
    store.set(KEY, &stored).await.unwrap();

    // Hidden from the listing.
    let tasks = repo.list().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, 1);

    // An unrelated mutation leaves the hidden record in place, blank title
    // and all.
    repo.toggle_complete(1, true).await.unwrap();
    let raw: Vec<TaskRecord> =
        serde_json::from_str(&raw_payload(&store).await.unwrap()).unwrap();
    let hidden = raw.iter().find(|r| r.id == 2).unwrap();
    assert_eq!(hidden.title.as_deref(), Some("   "));

    // Fixing the title via update makes it visible again.
    let fixed = Task {
        id: 2,
        title: "now visible".into(),
        completed: false,
        user_id: 1,
        due_date: None,
    };
    repo.update(&fixed).await.unwrap();
    let tasks = repo.list().await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().any(|t| t.id == 2 && t.title == "now visible"));
}

// --- remote create policies ---

#[tokio::test]
async fn test_create_best_effort_survives_remote_failure() {
    let remote = FakeRemote {
        seed: Vec::new(),
        add_fails: true,
        ..FakeRemote::default()
    };
    let (store, _remote, repo) = remote_repo(remote, CreatePolicy::BestEffort);
    // Populate the store so list() stays off the seed path.
    store.set(KEY, "[]").await.unwrap();

    let task = repo.create(TaskDraft::new("local only")).await.unwrap();
    let tasks = repo.list().await.unwrap();
    assert_eq!(tasks, vec![task]);
}

#[tokio::test]
async fn test_create_required_aborts_on_remote_failure() {
    let remote = FakeRemote {
        add_fails: true,
        ..FakeRemote::default()
    };
    let (store, _remote, repo) = remote_repo(remote, CreatePolicy::Required);
    store.set(KEY, "[]").await.unwrap();

    let err = repo.create(TaskDraft::new("never lands")).await.unwrap_err();
    assert!(matches!(err, TallyError::Remote(_)));
    assert_eq!(raw_payload(&store).await.unwrap(), "[]");
}

#[tokio::test]
async fn test_create_prefers_remote_defaults() {
    let due: DateTime<Utc> = "2026-12-24T18:00:00Z".parse().unwrap();
    let remote = FakeRemote {
        add_defaults: RemoteDefaults {
            title: Some("Remote title".into()),
            completed: Some(true),
            user_id: Some(9),
            due_date: Some(due),
        },
        ..FakeRemote::default()
    };
    let (store, _remote, repo) = remote_repo(remote, CreatePolicy::BestEffort);
    store.set(KEY, "[]").await.unwrap();

    let task = repo.create(TaskDraft::new("local title")).await.unwrap();
    assert_eq!(task.title, "Remote title");
    assert!(task.completed);
    assert_eq!(task.user_id, 9);
    assert_eq!(task.due_date, Some(due));
}

// --- failure propagation ---

#[tokio::test]
async fn test_storage_failure_propagates() {
    let repo = Repository::new(Arc::new(FailingStore), None, KEY, CreatePolicy::BestEffort);
    assert!(matches!(repo.list().await, Err(TallyError::Storage(_))));
    assert!(matches!(
        repo.create(TaskDraft::new("x")).await,
        Err(TallyError::Storage(_))
    ));
    assert!(matches!(
        repo.toggle_complete(1, true).await,
        Err(TallyError::Storage(_))
    ));
    assert!(matches!(repo.delete(&[1]).await, Err(TallyError::Storage(_))));
}

// --- helpers ---

#[test]
fn test_dedup_by_id_helper() {
    let out = dedup_by_id(vec![
        record(1, Some("a")),
        record(2, Some("b")),
        record(1, Some("c")),
        record(3, Some("d")),
    ]);
    let ids: Vec<i64> = out.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![2, 1, 3]);
    assert_eq!(out[1].title.as_deref(), Some("c"));
}

#[test]
fn test_fill_missing_titles_leaves_blanks() {
    let mut records = vec![record(1, None), record(2, Some("")), record(3, Some("x"))];
    fill_missing_titles(&mut records);
    assert_eq!(records[0].title.as_deref(), Some("Task 1"));
    assert_eq!(records[1].title.as_deref(), Some(""));
    assert_eq!(records[2].title.as_deref(), Some("x"));
}

#[test]
fn test_normalize_seed_titles_replaces_empty() {
    let mut records = vec![record(1, None), record(2, Some("")), record(3, Some("x"))];
    normalize_seed_titles(&mut records);
    assert_eq!(records[0].title.as_deref(), Some("Task 1"));
    assert_eq!(records[1].title.as_deref(), Some("Task 2"));
    assert_eq!(records[2].title.as_deref(), Some("x"));
}

#[test]
fn test_fresh_id_from_resamples_until_unique() {
    let existing: HashSet<i64> = [5, 6].into_iter().collect();
    let mut script = [5, 6, 6, 9].into_iter();
    let id = fresh_id_from(&existing, || script.next().unwrap());
    assert_eq!(id, 9);
}

#[test]
fn test_fresh_id_tolerates_empty_store() {
    let id = fresh_id(&[]);
    assert!(id > 0);
}
