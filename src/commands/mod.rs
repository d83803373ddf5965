//! Command handlers for the tally CLI.

mod status;
mod tasks;
mod watch;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;
use tally_cache::QueryCache;
use tally_core::config::Config;
use tally_core::error::TallyError;
use tally_core::task::Task;
use tally_core::traits::RemoteSource;
use tally_store::{RemoteApi, Repository, SqliteStore};

/// Query key for the task list.
pub const TASKS_KEY: &str = "tasks";

/// Everything a command handler needs: config, the repository, and the
/// list cache sitting above it.
pub struct App {
    pub config: Config,
    pub repository: Arc<Repository>,
    pub cache: QueryCache<Vec<Task>>,
}

impl App {
    /// Wire up the stack: sqlite store, optional remote client, repository,
    /// cache.
    pub async fn build(config: &Config) -> Result<Self, TallyError> {
        let store = Arc::new(SqliteStore::new(&config.store).await?);
        let remote: Option<Arc<dyn RemoteSource>> = if config.remote.enabled {
            Some(Arc::new(RemoteApi::from_config(&config.remote)))
        } else {
            None
        };
        let repository = Arc::new(Repository::new(
            store,
            remote,
            config.store.tasks_key.clone(),
            config.remote.create_policy,
        ));
        let cache = QueryCache::new(Duration::from_secs(config.cache.stale_secs));
        Ok(Self {
            config: config.clone(),
            repository,
            cache,
        })
    }

    /// Cached read of the task list.
    pub(crate) async fn cached_list(&self) -> Result<Vec<Task>, TallyError> {
        let repo = self.repository.clone();
        self.cache
            .get_or_fetch(TASKS_KEY, || async move { repo.list().await })
            .await
    }
}
