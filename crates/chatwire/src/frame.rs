//! Outbound frames.

use crate::error::ProtoError;
use serde::Serialize;
use uuid::Uuid;

/// Presence states the watcher can announce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    /// Actively present.
    Available,
    /// Connected but not to be counted as present.
    Unavailable,
}

/// An outbound frame, tagged the way the service expects.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    /// Authentication, sent immediately after the socket opens.
    Auth {
        /// Client-generated frame identifier.
        id: String,
        /// `Session <token>` authorization line.
        authorization: String,
        /// Client agent name.
        agent: String,
        /// Static client resource identifier.
        resource: String,
    },
    /// Presence announcement.
    PresenceChange {
        /// The announced presence state.
        presence: Presence,
    },
}

impl Frame {
    /// Build the authentication frame for a session token.
    pub fn auth(session_token: &str, agent: &str, resource: &str) -> Self {
        Self::Auth {
            id: Uuid::new_v4().simple().to_string(),
            authorization: format!("Session {session_token}"),
            agent: agent.to_string(),
            resource: resource.to_string(),
        }
    }

    /// Build a presence announcement frame.
    pub fn presence(presence: Presence) -> Self {
        Self::PresenceChange { presence }
    }

    /// Serialize to the JSON text sent on the socket.
    pub fn to_text(&self) -> Result<String, ProtoError> {
        Ok(serde_json::to_string(self)?)
    }
}
