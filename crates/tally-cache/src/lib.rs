//! # tally-cache
//!
//! An explicitly constructed query cache: one key maps to the last
//! successful result of a fetch. Mutations invalidate the key; concurrent
//! readers of the same key share a single in-flight fetch.
//!
//! No ambient singletons: the cache is built once and passed by reference
//! to whatever layer issues reads and writes.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};
use tally_core::error::TallyError;
use tokio::sync::{watch, Mutex};
use tracing::debug;

enum Entry<T> {
    Ready { value: T, fetched_at: Instant },
    InFlight(watch::Receiver<Option<Result<T, String>>>),
}

/// Key-addressed cache with a configurable staleness window and request
/// coalescing.
pub struct QueryCache<T> {
    entries: Mutex<HashMap<String, Entry<T>>>,
    stale_after: Duration,
}

impl<T: Clone + Send + Sync + 'static> QueryCache<T> {
    /// A `stale_after` of zero means every read is treated as stale (the
    /// task-list default); reads are still coalesced while a fetch is in
    /// flight.
    pub fn new(stale_after: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            stale_after,
        }
    }

    /// Return the cached value for `key` if it is still fresh, otherwise
    /// run `fetch`; or, if another caller is already fetching this key,
    /// wait for that caller's result instead of issuing a second fetch.
    ///
    /// Only successful results are cached. Followers of a failed fetch see
    /// the failure as `TallyError::Cache`.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<T, TallyError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, TallyError>>,
    {
        let waiter = {
            let mut entries = self.entries.lock().await;
            match entries.get(key) {
                Some(Entry::Ready { value, fetched_at })
                    if fetched_at.elapsed() < self.stale_after =>
                {
                    return Ok(value.clone());
                }
                Some(Entry::InFlight(rx)) => Some(rx.clone()),
                _ => None,
            }
        };

        if let Some(mut rx) = waiter {
            debug!("cache: joining in-flight fetch for '{key}'");
            return Self::wait(&mut rx).await;
        }

        // Become the leader for this key.
        let (tx, rx) = watch::channel(None);
        self.entries
            .lock()
            .await
            .insert(key.to_string(), Entry::InFlight(rx));

        let result = fetch().await;

        {
            let mut entries = self.entries.lock().await;
            match &result {
                Ok(value) => {
                    entries.insert(
                        key.to_string(),
                        Entry::Ready {
                            value: value.clone(),
                            fetched_at: Instant::now(),
                        },
                    );
                }
                Err(_) => {
                    // Failures are never cached. A racing invalidate may
                    // already have cleared the slot.
                    if matches!(entries.get(key), Some(Entry::InFlight(_))) {
                        entries.remove(key);
                    }
                }
            }
        }

        let shared = match &result {
            Ok(value) => Ok(value.clone()),
            Err(e) => Err(e.to_string()),
        };
        let _ = tx.send(Some(shared));

        result
    }

    /// Drop whatever is cached for `key`, forcing the next read through to
    /// the source. Call after every successful mutation.
    pub async fn invalidate(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    async fn wait(rx: &mut watch::Receiver<Option<Result<T, String>>>) -> Result<T, TallyError> {
        loop {
            if let Some(result) = rx.borrow().clone() {
                return result.map_err(TallyError::Cache);
            }
            if rx.changed().await.is_err() {
                return Err(TallyError::Cache("fetch abandoned".into()));
            }
        }
    }
}
