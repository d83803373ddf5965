//! Client for the public demo todos REST API.
//!
//! The remote is consulted for first-run seeding and for the best-effort
//! create call. It persists nothing server-side; update and delete are
//! local-only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::config::RemoteConfig;
use tally_core::error::TallyError;
use tally_core::task::TaskRecord;
use tally_core::traits::{RemoteDefaults, RemoteSource};
use tracing::debug;

/// Remote API client backed by reqwest.
pub struct RemoteApi {
    client: reqwest::Client,
    base_url: String,
    user_id: i64,
}

impl RemoteApi {
    /// Create from config values.
    pub fn from_config(config: &RemoteConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            user_id: config.user_id,
        }
    }
}

// --- Serde types ---

/// The seed endpoint answers either `{"todos": [...]}` or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum SeedResponse {
    Wrapped { todos: Vec<TaskRecord> },
    Bare(Vec<TaskRecord>),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddRequest<'a> {
    title: &'a str,
    completed: bool,
    user_id: i64,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct AddResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    completed: Option<bool>,
    #[serde(default)]
    user_id: Option<i64>,
    #[serde(default)]
    due_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Render a non-success response as "status: server message", falling back
/// to the raw body when it is not the expected JSON error shape.
async fn error_message(resp: reqwest::Response) -> String {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(ErrorBody { message: Some(m) }) => format!("{status}: {m}"),
        _ => format!("{status}: {text}"),
    }
}

#[async_trait]
impl RemoteSource for RemoteApi {
    async fn fetch_tasks(&self) -> Result<Vec<TaskRecord>, TallyError> {
        let url = format!(
            "{}/todos/user/{}",
            self.base_url.trim_end_matches('/'),
            self.user_id
        );
        debug!("remote: GET {url}");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TallyError::Remote(format!("seed request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(TallyError::Remote(format!(
                "seed returned {}",
                error_message(resp).await
            )));
        }

        let parsed: SeedResponse = resp
            .json()
            .await
            .map_err(|e| TallyError::Remote(format!("failed to parse seed response: {e}")))?;

        Ok(match parsed {
            SeedResponse::Wrapped { todos } => todos,
            SeedResponse::Bare(items) => items,
        })
    }

    async fn create_task(
        &self,
        title: &str,
        completed: bool,
        user_id: i64,
    ) -> Result<RemoteDefaults, TallyError> {
        let url = format!("{}/todos/add", self.base_url.trim_end_matches('/'));
        let body = AddRequest {
            title,
            completed,
            user_id,
        };
        debug!("remote: POST {url}");

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TallyError::Remote(format!("add request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(TallyError::Remote(format!(
                "add returned {}",
                error_message(resp).await
            )));
        }

        let parsed: AddResponse = resp
            .json()
            .await
            .map_err(|e| TallyError::Remote(format!("failed to parse add response: {e}")))?;

        Ok(RemoteDefaults {
            title: parsed.title,
            completed: parsed.completed,
            user_id: parsed.user_id,
            due_date: parsed.due_date,
        })
    }
}
