//! Shared fakes and fixtures for integration tests.
//!
//! The collaborator traits (alert sink, indicator, opener, API) get
//! recording implementations so tests can assert on what the core did
//! without a live service.

// Each integration test binary compiles its own copy of this module and
// uses a different subset of it.
#![allow(dead_code)]

use async_trait::async_trait;
use chatwatch::alert::{Alert, AlertSink};
use chatwatch::api::ChatApi;
use chatwatch::error::WatchError;
use chatwatch::surface::{Indicator, UrlOpener};
use chatwire::info::{EntityRecord, Info, Me};
use chatwire::tabs::{TabEntity, TabMetadata, TabState};
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Alert sink that records every show/clear and models the visible set.
#[derive(Default)]
pub struct RecordingSink {
    pub shown: Mutex<Vec<(String, Alert)>>,
    pub visible: Mutex<HashMap<String, Alert>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.visible.lock().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn visible_alert(&self, id: &str) -> Option<Alert> {
        self.visible.lock().unwrap().get(id).cloned()
    }

    pub fn shown_count(&self) -> usize {
        self.shown.lock().unwrap().len()
    }

    pub fn last_shown(&self) -> Option<(String, Alert)> {
        self.shown.lock().unwrap().last().cloned()
    }
}

impl AlertSink for RecordingSink {
    fn show(&self, alert: Alert) -> String {
        let id = alert
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        self.shown.lock().unwrap().push((id.clone(), alert.clone()));
        self.visible.lock().unwrap().insert(id.clone(), alert);
        id
    }

    fn clear(&self, id: &str) {
        self.visible.lock().unwrap().remove(id);
    }
}

/// Boxable sink that forwards to a shared [`RecordingSink`] handle, letting a
/// test keep its own `Arc` clone while handing ownership to the notifier.
pub struct SharedSink(pub std::sync::Arc<RecordingSink>);

impl AlertSink for SharedSink {
    fn show(&self, alert: Alert) -> String {
        self.0.show(alert)
    }

    fn clear(&self, id: &str) {
        self.0.clear(id);
    }
}

/// Indicator that remembers the last badge and title.
#[derive(Default)]
pub struct RecordingIndicator {
    pub badge: Mutex<String>,
    pub title: Mutex<String>,
}

impl RecordingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn badge(&self) -> String {
        self.badge.lock().unwrap().clone()
    }

    pub fn title(&self) -> String {
        self.title.lock().unwrap().clone()
    }
}

impl Indicator for RecordingIndicator {
    fn set_badge(&self, text: &str) {
        *self.badge.lock().unwrap() = text.to_string();
    }

    fn set_title(&self, title: &str) {
        *self.title.lock().unwrap() = title.to_string();
    }
}

/// Opener that records requested URLs.
#[derive(Default)]
pub struct RecordingOpener {
    pub opened: Mutex<Vec<String>>,
}

impl UrlOpener for RecordingOpener {
    fn open(&self, url: &str) {
        self.opened.lock().unwrap().push(url.to_string());
    }
}

/// Canned API responses.
pub struct FakeApi {
    pub info: Info,
    pub tabs: Mutex<HashMap<String, TabState>>,
}

impl FakeApi {
    pub fn new(info: Info) -> Self {
        Self {
            info,
            tabs: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_tabs(info: Info, tabs: HashMap<String, TabState>) -> Self {
        Self {
            info,
            tabs: Mutex::new(tabs),
        }
    }
}

#[async_trait]
impl ChatApi for FakeApi {
    async fn fetch_info(&self, _organization: &str) -> Result<Info, WatchError> {
        Ok(self.info.clone())
    }

    async fn fetch_tab_state(
        &self,
        _organization: &str,
    ) -> Result<HashMap<String, TabState>, WatchError> {
        Ok(self.tabs.lock().unwrap().clone())
    }
}

pub fn record(id: i64, jid: &str, descriptor: &str) -> EntityRecord {
    EntityRecord {
        id,
        jid: jid.to_string(),
        descriptor: descriptor.to_string(),
        avatar_url: Some(format!("https://cdn.example/{jid}.png")),
    }
}

/// Fixture directory: me is Uma (u1); one team and one forum.
pub fn directory() -> Info {
    Info {
        me: Me { id: 1 },
        users: vec![record(1, "u1", "Uma"), record(2, "u2", "Viktor")],
        teams: vec![record(10, "t1", "Platform")],
        forums: vec![record(20, "f1", "Announcements")],
    }
}

pub fn tab(id: i64, descriptor: &str, workroom: bool, unread: bool, hour: u32) -> TabState {
    TabState {
        last_message_id: 100,
        last_read_id: if unread { 90 } else { 100 },
        last_message_date: Some(Utc.with_ymd_and_hms(2026, 8, 7, hour, 0, 0).unwrap()),
        entity: TabEntity {
            id,
            descriptor: descriptor.to_string(),
            metadata: TabMetadata {
                kind: if workroom {
                    "Entity.Workroom".to_string()
                } else {
                    "Entity.User".to_string()
                },
            },
        },
    }
}
