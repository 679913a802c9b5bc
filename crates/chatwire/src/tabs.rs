//! Per-conversation read/unread state ("tabs").

use crate::directory::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// OData metadata wrapper on a tab's entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabMetadata {
    /// Service-side entity type string (e.g. `Entity.Workroom`).
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// The conversation entity a tab tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabEntity {
    /// Stable directory identifier.
    pub id: i64,
    /// Display descriptor.
    #[serde(rename = "__descriptor")]
    pub descriptor: String,
    /// OData metadata.
    #[serde(rename = "__metadata", default)]
    pub metadata: TabMetadata,
}

impl TabEntity {
    /// Which conversation page this tab links to.
    ///
    /// Workrooms map to team pages; everything else is a user conversation.
    pub fn kind(&self) -> EntityKind {
        if self.metadata.kind == "Entity.Workroom" {
            EntityKind::Team
        } else {
            EntityKind::User
        }
    }
}

/// Read/unread state of one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabState {
    /// Identifier of the newest message in the conversation.
    pub last_message_id: i64,
    /// Identifier of the newest message the user has read.
    #[serde(default)]
    pub last_read_id: i64,
    /// Timestamp of the newest message.
    #[serde(default)]
    pub last_message_date: Option<DateTime<Utc>>,
    /// The conversation entity.
    pub entity: TabEntity,
}

impl TabState {
    /// A tab is unread when its last message outruns the last-read marker.
    ///
    /// Identifiers are assumed monotonically increasing, so a plain integer
    /// comparison suffices; no timestamp comparison is involved.
    pub fn is_unread(&self) -> bool {
        self.last_message_id > self.last_read_id
    }
}

/// Response envelope of the tab-state endpoint.
#[derive(Debug, Deserialize)]
pub struct TabStateEnvelope {
    /// Mapping from conversation id to tab state.
    pub d: HashMap<String, TabState>,
}

/// Filter a tab-state map down to its unread tabs, most recent first.
pub fn unread_tabs(state: HashMap<String, TabState>) -> Vec<TabState> {
    let mut unread: Vec<TabState> = state.into_values().filter(TabState::is_unread).collect();
    unread.sort_by(|a, b| b.last_message_date.cmp(&a.last_message_date));
    unread
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tab(descriptor: &str, last_message_id: i64, last_read_id: i64, hour: u32) -> TabState {
        TabState {
            last_message_id,
            last_read_id,
            last_message_date: Some(Utc.with_ymd_and_hms(2026, 8, 7, hour, 0, 0).unwrap()),
            entity: TabEntity {
                id: last_message_id,
                descriptor: descriptor.to_string(),
                metadata: TabMetadata::default(),
            },
        }
    }

    #[test]
    fn test_unread_is_an_integer_comparison() {
        assert!(tab("a", 5, 4, 0).is_unread());
        assert!(!tab("b", 5, 5, 0).is_unread());
        assert!(!tab("c", 5, 9, 0).is_unread());
    }

    #[test]
    fn test_unread_tabs_sorted_most_recent_first() {
        let state = HashMap::from([
            ("1".to_string(), tab("older", 10, 0, 8)),
            ("2".to_string(), tab("newest", 20, 0, 12)),
            ("3".to_string(), tab("read", 30, 30, 23)),
        ]);
        let unread = unread_tabs(state);
        let descriptors: Vec<&str> = unread.iter().map(|t| t.entity.descriptor.as_str()).collect();
        assert_eq!(descriptors, vec!["newest", "older"]);
    }

    #[test]
    fn test_workroom_maps_to_team_page() {
        let mut workroom = tab("Platform", 1, 0, 0);
        workroom.entity.metadata.kind = "Entity.Workroom".to_string();
        assert_eq!(workroom.entity.kind(), EntityKind::Team);
        assert_eq!(tab("Uma", 1, 0, 0).entity.kind(), EntityKind::User);
    }

    #[test]
    fn test_envelope_parse() {
        let body = r#"{
            "d": {
                "42": {
                    "lastMessageId": 900,
                    "lastReadId": 880,
                    "lastMessageDate": "2026-08-07T09:30:00Z",
                    "entity": {"id": 42, "__descriptor": "Platform", "__metadata": {"type": "Entity.Workroom"}}
                }
            }
        }"#;
        let envelope: TabStateEnvelope = serde_json::from_str(body).unwrap();
        let tab = &envelope.d["42"];
        assert!(tab.is_unread());
        assert_eq!(tab.entity.descriptor, "Platform");
        assert_eq!(tab.entity.kind(), EntityKind::Team);
    }
}
