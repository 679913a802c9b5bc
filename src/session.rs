//! Session-local state: the chat log, presence map, and unread counter.
//!
//! One `Session` value is owned by the connection watcher and handed to the
//! event router by reference, never accessed as an ambient global. Every
//! close event fully resets it before a reconnect attempt may begin, so a
//! new connection never observes state from the previous one.

use chatwire::{Entity, Event, Info};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// A chat-log entry stamped with local receipt time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedEvent {
    /// Local receipt time.
    pub time: DateTime<Utc>,
    /// The inbound event as parsed off the wire.
    pub event: Event,
}

/// Last-known presence of a directory entity. Overwritten on each update,
/// never merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceEntry {
    pub descriptor: String,
    pub presence: String,
    pub received: Option<DateTime<Utc>>,
    pub entity: Entity,
}

/// Mutable per-connection state.
#[derive(Debug, Default)]
pub struct Session {
    info: Option<Arc<Info>>,
    chat_log: Vec<LoggedEvent>,
    presence: HashMap<String, PresenceEntry>,
    unread: u32,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hard reset: drop the snapshot, the log, the presence map, and the
    /// unread counter.
    pub fn reset(&mut self) {
        self.info = None;
        self.chat_log.clear();
        self.presence.clear();
        self.unread = 0;
    }

    /// Install the snapshot fetched for the current attempt.
    pub fn install_info(&mut self, info: Arc<Info>) {
        self.info = Some(info);
    }

    pub fn info(&self) -> Option<&Arc<Info>> {
        self.info.as_ref()
    }

    /// Append an event to the chat log and bump the unread counter.
    /// Returns the new count for the badge.
    pub fn record(&mut self, event: Event) -> u32 {
        self.chat_log.push(LoggedEvent {
            time: Utc::now(),
            event,
        });
        self.unread += 1;
        self.unread
    }

    /// Overwrite the last-known presence for an address token.
    pub fn update_presence(&mut self, jid: String, entry: PresenceEntry) {
        self.presence.insert(jid, entry);
    }

    /// Zero the unread counter: the local activity view was opened.
    pub fn mark_viewed(&mut self) {
        self.unread = 0;
    }

    pub fn chat_log(&self) -> &[LoggedEvent] {
        &self.chat_log
    }

    pub fn presence(&self) -> &HashMap<String, PresenceEntry> {
        &self.presence
    }

    pub fn unread(&self) -> u32 {
        self.unread
    }
}
