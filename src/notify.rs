//! Terminal-backed notification facility for the foreground `watch` loop.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use console::style;
use std::collections::HashMap;
use tally_core::error::TallyError;
use tally_core::notification::{NotificationPayload, TriggerHandle};
use tally_core::traits::Notifier;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Delivers triggers by printing to the terminal when their time comes.
/// Every registered trigger is one sleeping tokio task; cancel aborts it.
#[derive(Default)]
pub struct TerminalNotifier {
    pending: Mutex<HashMap<TriggerHandle, JoinHandle<()>>>,
}

impl TerminalNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Notifier for TerminalNotifier {
    async fn request_permission(&self) -> Result<bool, TallyError> {
        // The terminal is ours; there is nobody to ask.
        Ok(true)
    }

    async fn schedule(
        &self,
        at: DateTime<Utc>,
        payload: NotificationPayload,
    ) -> Result<TriggerHandle, TallyError> {
        let delay = (at - Utc::now())
            .to_std()
            .map_err(|_| TallyError::Notify("trigger time is in the past".into()))?;
        let handle = TriggerHandle::new();
        let job = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            println!(
                "{} {}",
                style(format!("[{}]", payload.title)).yellow().bold(),
                payload.body
            );
        });
        self.pending.lock().await.insert(handle, job);
        Ok(handle)
    }

    async fn cancel(&self, handle: TriggerHandle) -> Result<(), TallyError> {
        if let Some(job) = self.pending.lock().await.remove(&handle) {
            job.abort();
        }
        Ok(())
    }
}
