//! Inbound event frames.
//!
//! Every frame off the socket is a JSON object with a `type` discriminator.
//! [`Event::parse`] classifies the closed set the watcher understands and
//! preserves anything else as [`Event::Unknown`] with its raw payload, so
//! protocol evolution on the remote side never silently drops activity.

use crate::error::ProtoError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bridged/external sender override carried on some chat events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSource {
    /// Display name to use instead of the resolved sender's descriptor.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Avatar to use instead of the resolved sender's avatar.
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Presence update payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceUpdate {
    /// Address token of the entity whose presence changed.
    pub from: String,
    /// New presence state.
    pub presence: String,
    /// Server-side timestamp of the change.
    #[serde(default)]
    pub received: Option<DateTime<Utc>>,
    /// Client identifier that produced the change.
    #[serde(default)]
    pub client: Option<String>,
}

/// Typing indicator payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypingNotice {
    /// Sender address token.
    pub from: String,
    /// Recipient address token.
    pub to: String,
    /// Typing state reported by the sender's client.
    #[serde(default)]
    pub state: Option<String>,
    /// Message key the indicator refers to, when the service provides one.
    #[serde(default)]
    pub key: Option<String>,
}

/// Chat message payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender address token.
    pub from: String,
    /// Recipient address token.
    pub to: String,
    /// Message text.
    pub text: String,
    /// Stable message key.
    #[serde(default)]
    pub key: Option<String>,
    /// Server-side timestamp.
    #[serde(default)]
    pub received: Option<DateTime<Utc>>,
    /// Sender display override for bridged/external sources.
    #[serde(rename = "createSource", default)]
    pub create_source: Option<CreateSource>,
}

/// Edit or delete notice for a previously delivered message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRevision {
    /// Sender address token.
    pub from: String,
    /// Recipient address token.
    pub to: String,
    /// Key of the message being revised.
    #[serde(default)]
    pub key: Option<String>,
    /// Replacement text (edits) or last text (deletions).
    #[serde(default)]
    pub text: Option<String>,
}

/// An inbound frame, classified by its `type` discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Authentication acknowledgement; finalizes the handshake.
    Ack,
    /// Presence change for a directory entity.
    PresenceChange(PresenceUpdate),
    /// Typing indicator.
    UserTyping(TypingNotice),
    /// New chat message.
    Chat(ChatMessage),
    /// A previously delivered message was deleted.
    ChatDeleted(ChatRevision),
    /// A previously delivered message was edited.
    ChatUpdated(ChatRevision),
    /// Service-side bookkeeping frame; a protocol no-op for the watcher.
    #[serde(rename = "event")]
    Service,
    /// Anything outside the closed set, with the raw payload preserved.
    Unknown {
        /// The unrecognized discriminator.
        kind: String,
        /// The raw frame text.
        raw: String,
    },
}

impl Event {
    /// Classify a raw text frame.
    ///
    /// Unrecognized discriminators are preserved as [`Event::Unknown`]
    /// rather than rejected; only frames without a discriminator or with a
    /// malformed payload for a known type are errors.
    pub fn parse(raw: &str) -> Result<Self, ProtoError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let kind = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or(ProtoError::MissingType)?
            .to_string();
        match kind.as_str() {
            "ack" => Ok(Self::Ack),
            "event" => Ok(Self::Service),
            "presence_change" => Ok(Self::PresenceChange(serde_json::from_value(value)?)),
            "user_typing" => Ok(Self::UserTyping(serde_json::from_value(value)?)),
            "chat" => Ok(Self::Chat(serde_json::from_value(value)?)),
            "chat_deleted" => Ok(Self::ChatDeleted(serde_json::from_value(value)?)),
            "chat_updated" => Ok(Self::ChatUpdated(serde_json::from_value(value)?)),
            _ => Ok(Self::Unknown {
                kind,
                raw: raw.to_string(),
            }),
        }
    }

    /// Wire discriminator for this event.
    pub fn kind(&self) -> &str {
        match self {
            Self::Ack => "ack",
            Self::PresenceChange(_) => "presence_change",
            Self::UserTyping(_) => "user_typing",
            Self::Chat(_) => "chat",
            Self::ChatDeleted(_) => "chat_deleted",
            Self::ChatUpdated(_) => "chat_updated",
            Self::Service => "event",
            Self::Unknown { kind, .. } => kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ack_ignores_extra_fields() {
        let event = Event::parse(r#"{"type":"ack","id":"BkD971TWZ"}"#).unwrap();
        assert_eq!(event, Event::Ack);
    }

    #[test]
    fn test_parse_chat() {
        let event = Event::parse(r#"{"type":"chat","from":"u1","to":"t1","text":"hi","key":"k9"}"#).unwrap();
        match event {
            Event::Chat(message) => {
                assert_eq!(message.from, "u1");
                assert_eq!(message.to, "t1");
                assert_eq!(message.text, "hi");
                assert_eq!(message.key.as_deref(), Some("k9"));
                assert!(message.create_source.is_none());
            }
            other => panic!("expected chat, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_chat_with_create_source() {
        let raw = r#"{"type":"chat","from":"u1","to":"u2","text":"ping",
                      "createSource":{"displayName":"Bridge Bot","avatar":"https://cdn/bot.png"}}"#;
        let Event::Chat(message) = Event::parse(raw).unwrap() else {
            panic!("expected chat");
        };
        let source = message.create_source.unwrap();
        assert_eq!(source.display_name.as_deref(), Some("Bridge Bot"));
        assert_eq!(source.avatar.as_deref(), Some("https://cdn/bot.png"));
    }

    #[test]
    fn test_parse_presence_change() {
        let raw = r#"{"type":"presence_change","from":"u1","presence":"available",
                      "received":"2026-08-07T10:00:00Z","client":"web"}"#;
        let Event::PresenceChange(update) = Event::parse(raw).unwrap() else {
            panic!("expected presence_change");
        };
        assert_eq!(update.presence, "available");
        assert_eq!(update.client.as_deref(), Some("web"));
        assert!(update.received.is_some());
    }

    #[test]
    fn test_parse_user_typing() {
        let Event::UserTyping(notice) =
            Event::parse(r#"{"type":"user_typing","from":"u1","to":"u2","state":"composing"}"#).unwrap()
        else {
            panic!("expected user_typing");
        };
        assert_eq!(notice.state.as_deref(), Some("composing"));
    }

    #[test]
    fn test_parse_service_is_noop() {
        let event = Event::parse(r#"{"type":"event","topic":"/acme/whatever"}"#).unwrap();
        assert_eq!(event, Event::Service);
    }

    #[test]
    fn test_unknown_type_keeps_raw_payload() {
        let raw = r#"{"type":"wormhole","payload":42}"#;
        let Event::Unknown { kind, raw: kept } = Event::parse(raw).unwrap() else {
            panic!("expected unknown");
        };
        assert_eq!(kind, "wormhole");
        assert_eq!(kept, raw);
    }

    #[test]
    fn test_missing_type_is_an_error() {
        assert!(matches!(
            Event::parse(r#"{"text":"hi"}"#),
            Err(ProtoError::MissingType)
        ));
    }

    #[test]
    fn test_logged_event_round_trips_through_serde() {
        let event = Event::Chat(ChatMessage {
            from: "u1".into(),
            to: "u2".into(),
            text: "hi".into(),
            key: None,
            received: None,
            create_source: None,
        });
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
