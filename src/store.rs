//! Best-effort local persistence.
//!
//! The store is an external collaborator: the watcher writes through it but
//! never fails on a store error. The file-backed implementation logs the
//! problem and keeps going.

use crate::alert::AlertMetadata;
use crate::session::{LoggedEvent, PresenceEntry};
use async_trait::async_trait;
use chatwire::{Info, TabState};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::warn;

/// Everything the watcher persists between runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
    pub organization: Option<String>,
    pub info: Option<Info>,
    pub chat_messages: Vec<LoggedEvent>,
    pub users: HashMap<String, PresenceEntry>,
    pub notifications: HashMap<String, AlertMetadata>,
    pub retry_count: Option<u32>,
    pub unread_tabs: Vec<TabState>,
    pub unread_notification_id: Option<String>,
}

/// Persistence surface the watcher writes through.
#[async_trait]
pub trait Store: Send + Sync {
    /// Read the persisted retry counter (zero when absent).
    async fn retry_count(&self) -> u32;

    /// Persist the retry counter.
    async fn set_retry_count(&self, count: u32);

    /// Remove the retry counter (a successful open).
    async fn clear_retry_count(&self);

    /// Replace the cached Info snapshot; `None` clears it.
    async fn put_info(&self, organization: Option<&str>, info: Option<&Info>);

    /// Replace the persisted chat log.
    async fn put_chat_log(&self, log: &[LoggedEvent]);

    /// Replace the persisted presence map.
    async fn put_presence(&self, users: &HashMap<String, PresenceEntry>);

    /// Record alert click metadata under its alert identifier.
    async fn put_alert_metadata(&self, id: &str, metadata: &AlertMetadata);

    /// Look up alert click metadata.
    async fn alert_metadata(&self, id: &str) -> Option<AlertMetadata>;

    /// Replace the last unread-tabs result and its alert identifier.
    async fn put_unread_tabs(&self, tabs: &[TabState], alert_id: Option<&str>);

    /// Read the last unread-tabs result.
    async fn unread_tabs(&self) -> Vec<TabState>;
}

/// File-backed store: one JSON document, atomically replaced on write.
pub struct JsonStore {
    path: PathBuf,
    state: Mutex<PersistedState>,
}

impl JsonStore {
    /// Open the state file, starting fresh when it is missing or unreadable.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let state = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "State file unreadable, starting fresh");
                PersistedState::default()
            }),
            Err(_) => PersistedState::default(),
        };
        Self {
            path,
            state: Mutex::new(state),
        }
    }

    async fn mutate<F>(&self, apply: F)
    where
        F: FnOnce(&mut PersistedState),
    {
        let mut state = self.state.lock().await;
        apply(&mut state);
        if let Err(e) = self.flush(&state) {
            warn!(path = %self.path.display(), error = %e, "Failed to persist state");
        }
    }

    fn flush(&self, state: &PersistedState) -> std::io::Result<()> {
        let tmp = self.path.with_extension("tmp");
        let text = serde_json::to_string_pretty(state).map_err(std::io::Error::other)?;
        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, &self.path)
    }
}

#[async_trait]
impl Store for JsonStore {
    async fn retry_count(&self) -> u32 {
        self.state.lock().await.retry_count.unwrap_or(0)
    }

    async fn set_retry_count(&self, count: u32) {
        self.mutate(|state| state.retry_count = Some(count)).await;
    }

    async fn clear_retry_count(&self) {
        self.mutate(|state| state.retry_count = None).await;
    }

    async fn put_info(&self, organization: Option<&str>, info: Option<&Info>) {
        self.mutate(|state| {
            state.organization = organization.map(str::to_string);
            state.info = info.cloned();
        })
        .await;
    }

    async fn put_chat_log(&self, log: &[LoggedEvent]) {
        self.mutate(|state| state.chat_messages = log.to_vec()).await;
    }

    async fn put_presence(&self, users: &HashMap<String, PresenceEntry>) {
        self.mutate(|state| state.users = users.clone()).await;
    }

    async fn put_alert_metadata(&self, id: &str, metadata: &AlertMetadata) {
        self.mutate(|state| {
            state.notifications.insert(id.to_string(), metadata.clone());
        })
        .await;
    }

    async fn alert_metadata(&self, id: &str) -> Option<AlertMetadata> {
        self.state.lock().await.notifications.get(id).cloned()
    }

    async fn put_unread_tabs(&self, tabs: &[TabState], alert_id: Option<&str>) {
        self.mutate(|state| {
            state.unread_tabs = tabs.to_vec();
            state.unread_notification_id = alert_id.map(str::to_string);
        })
        .await;
    }

    async fn unread_tabs(&self) -> Vec<TabState> {
        self.state.lock().await.unread_tabs.clone()
    }
}

/// In-memory store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<PersistedState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current state for inspection.
    pub async fn snapshot(&self) -> PersistedState {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn retry_count(&self) -> u32 {
        self.state.lock().await.retry_count.unwrap_or(0)
    }

    async fn set_retry_count(&self, count: u32) {
        self.state.lock().await.retry_count = Some(count);
    }

    async fn clear_retry_count(&self) {
        self.state.lock().await.retry_count = None;
    }

    async fn put_info(&self, organization: Option<&str>, info: Option<&Info>) {
        let mut state = self.state.lock().await;
        state.organization = organization.map(str::to_string);
        state.info = info.cloned();
    }

    async fn put_chat_log(&self, log: &[LoggedEvent]) {
        self.state.lock().await.chat_messages = log.to_vec();
    }

    async fn put_presence(&self, users: &HashMap<String, PresenceEntry>) {
        self.state.lock().await.users = users.clone();
    }

    async fn put_alert_metadata(&self, id: &str, metadata: &AlertMetadata) {
        self.state
            .lock()
            .await
            .notifications
            .insert(id.to_string(), metadata.clone());
    }

    async fn alert_metadata(&self, id: &str) -> Option<AlertMetadata> {
        self.state.lock().await.notifications.get(id).cloned()
    }

    async fn put_unread_tabs(&self, tabs: &[TabState], alert_id: Option<&str>) {
        let mut state = self.state.lock().await;
        state.unread_tabs = tabs.to_vec();
        state.unread_notification_id = alert_id.map(str::to_string);
    }

    async fn unread_tabs(&self) -> Vec<TabState> {
        self.state.lock().await.unread_tabs.clone()
    }
}
