//! The Info snapshot: a per-connection directory of known entities.

use serde::{Deserialize, Serialize};

/// The authenticated user's identity within the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Me {
    /// Stable directory identifier of the local user.
    pub id: i64,
}

/// One user, team, or forum record from the Info directory.
///
/// Only the fields needed for display and navigation are kept; everything
/// else in the service's payload is dropped at parse time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    /// Stable directory identifier.
    pub id: i64,
    /// Routable address token.
    pub jid: String,
    /// Human-readable display name.
    pub descriptor: String,
    /// Avatar reference, when the directory has one.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// A directory of known entities, fetched once per connection attempt.
///
/// Immutable after the fetch; a reconnect replaces it wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Info {
    /// The authenticated user.
    pub me: Me,
    /// Known user records.
    #[serde(default)]
    pub users: Vec<EntityRecord>,
    /// Known team records.
    #[serde(default)]
    pub teams: Vec<EntityRecord>,
    /// Known forum records.
    #[serde(default)]
    pub forums: Vec<EntityRecord>,
}

/// Response envelope of the descriptor endpoint.
#[derive(Debug, Deserialize)]
pub struct InfoEnvelope {
    /// The snapshot payload.
    pub d: Info,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_parse_drops_unknown_fields() {
        let body = r#"{
            "d": {
                "me": {"id": 7, "username": "me", "timeZone": "UTC"},
                "users": [
                    {"id": 1, "jid": "u1", "descriptor": "Uma", "avatarUrl": "https://cdn/u1.png", "extra": true}
                ],
                "teams": [],
                "forums": []
            }
        }"#;
        let envelope: InfoEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.d.me.id, 7);
        assert_eq!(envelope.d.users.len(), 1);
        assert_eq!(envelope.d.users[0].descriptor, "Uma");
        assert_eq!(envelope.d.users[0].avatar_url.as_deref(), Some("https://cdn/u1.png"));
    }

    #[test]
    fn test_missing_collections_default_to_empty() {
        let body = r#"{"d": {"me": {"id": 1}}}"#;
        let envelope: InfoEnvelope = serde_json::from_str(body).unwrap();
        assert!(envelope.d.users.is_empty());
        assert!(envelope.d.teams.is_empty());
        assert!(envelope.d.forums.is_empty());
    }
}
