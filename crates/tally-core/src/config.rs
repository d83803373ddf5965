use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::TallyError;

/// Top-level Tally configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tally: TallyConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub reminder: ReminderConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TallyConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Persistent store config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// Key under which the task array lives in the key-value store.
    #[serde(default = "default_tasks_key")]
    pub tasks_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            tasks_key: default_tasks_key(),
        }
    }
}

/// What to do when the remote create call fails.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CreatePolicy {
    /// Log the remote failure and proceed with local-only creation (default).
    #[default]
    BestEffort,
    /// Abort creation; nothing is persisted locally.
    Required,
}

/// Remote demo API config. The remote is a seed source plus a best-effort
/// create endpoint; it never owns update or delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    #[serde(default)]
    pub create_policy: CreatePolicy,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_base_url(),
            user_id: default_user_id(),
            create_policy: CreatePolicy::default(),
        }
    }
}

/// Reminder scheduling config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Minutes before the due time for the early trigger.
    #[serde(default = "default_lead_minutes")]
    pub lead_minutes: i64,
    /// Poll interval for the `watch` delivery loop.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lead_minutes: default_lead_minutes(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

/// Query cache config. `stale_secs = 0` means every read is treated as
/// stale (the task-list default); reads are still coalesced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub stale_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { stale_secs: 0 }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_db_path() -> String {
    "~/.tally/data/tally.db".to_string()
}

fn default_tasks_key() -> String {
    "@todos".to_string()
}

fn default_base_url() -> String {
    "https://dummyjson.com".to_string()
}

fn default_user_id() -> i64 {
    crate::task::DEFAULT_USER_ID
}

fn default_lead_minutes() -> i64 {
    5
}

fn default_poll_interval() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, TallyError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!("Config file not found at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| TallyError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| TallyError::Config(format!("failed to parse config: {}", e)))?;

    Ok(config)
}
