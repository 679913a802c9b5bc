//! Entity resolution against an Info snapshot.
//!
//! Lookup order across collections is fixed: users, then teams, then forums;
//! first match wins. A token with no match resolves to a fallback entity
//! carrying the raw jid as its descriptor, so callers never fail on an
//! unknown address.

use crate::info::{EntityRecord, Info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which directory collection an entity was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A person.
    User,
    /// A private team.
    Team,
    /// An open forum.
    Forum,
}

impl EntityKind {
    /// URL fragment segment for this collection's conversation pages.
    pub fn segment(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Team => "teams",
            Self::Forum => "forums",
        }
    }
}

/// A display-ready entity resolved from an address token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Collection the entity came from; `None` for the fallback sentinel.
    pub kind: Option<EntityKind>,
    /// Stable directory identifier; `None` for the fallback sentinel.
    pub id: Option<i64>,
    /// Routable address token.
    pub jid: String,
    /// Human-readable descriptor (the raw jid for the fallback sentinel).
    pub descriptor: String,
    /// Avatar reference, when the directory has one.
    pub avatar_url: Option<String>,
}

impl Entity {
    fn from_record(kind: EntityKind, record: &EntityRecord) -> Self {
        Self {
            kind: Some(kind),
            id: Some(record.id),
            jid: record.jid.clone(),
            descriptor: record.descriptor.clone(),
            avatar_url: record.avatar_url.clone(),
        }
    }

    /// Sentinel entity for an address token with no directory match.
    pub fn fallback(jid: &str) -> Self {
        Self {
            kind: None,
            id: None,
            jid: jid.to_string(),
            descriptor: jid.to_string(),
            avatar_url: None,
        }
    }

    /// Whether this entity resolved to a real directory record.
    pub fn is_resolved(&self) -> bool {
        self.kind.is_some()
    }
}

/// Resolves address tokens against one Info snapshot.
///
/// Constructed fresh for every connection attempt and handed to the event
/// router explicitly. Never mutates the snapshot.
#[derive(Debug, Clone)]
pub struct Resolver {
    info: Arc<Info>,
}

impl Resolver {
    /// Build a resolver over a fetched snapshot.
    pub fn new(info: Arc<Info>) -> Self {
        Self { info }
    }

    /// Identifier of the authenticated user.
    pub fn me(&self) -> i64 {
        self.info.me.id
    }

    /// Resolve a single address token.
    ///
    /// Tokens are expected to be unique across collections in practice; the
    /// users-teams-forums search order is the deliberate tie-break.
    pub fn resolve(&self, jid: &str) -> Entity {
        fn hit(records: &[EntityRecord], kind: EntityKind, jid: &str) -> Option<Entity> {
            records
                .iter()
                .find(|record| record.jid == jid)
                .map(|record| Entity::from_record(kind, record))
        }

        hit(&self.info.users, EntityKind::User, jid)
            .or_else(|| hit(&self.info.teams, EntityKind::Team, jid))
            .or_else(|| hit(&self.info.forums, EntityKind::Forum, jid))
            .unwrap_or_else(|| Entity::fallback(jid))
    }

    /// Resolve a sender/recipient pair, preserving order.
    pub fn resolve_pair(&self, from: &str, to: &str) -> (Entity, Entity) {
        (self.resolve(from), self.resolve(to))
    }

    /// Resolve many tokens, preserving input order.
    pub fn resolve_all<'a, I>(&self, jids: I) -> Vec<Entity>
    where
        I: IntoIterator<Item = &'a str>,
    {
        jids.into_iter().map(|jid| self.resolve(jid)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::Me;

    fn record(id: i64, jid: &str, descriptor: &str) -> EntityRecord {
        EntityRecord {
            id,
            jid: jid.to_string(),
            descriptor: descriptor.to_string(),
            avatar_url: None,
        }
    }

    fn resolver() -> Resolver {
        Resolver::new(Arc::new(Info {
            me: Me { id: 1 },
            users: vec![record(1, "u1", "Uma"), record(2, "shared", "User Shared")],
            teams: vec![record(10, "t1", "Platform"), record(11, "shared", "Team Shared")],
            forums: vec![record(20, "f1", "Announcements")],
        }))
    }

    #[test]
    fn test_resolve_tags_collection() {
        let resolver = resolver();
        assert_eq!(resolver.resolve("u1").kind, Some(EntityKind::User));
        assert_eq!(resolver.resolve("t1").kind, Some(EntityKind::Team));
        assert_eq!(resolver.resolve("f1").kind, Some(EntityKind::Forum));
    }

    #[test]
    fn test_resolve_order_is_the_tie_break() {
        // "shared" exists in both users and teams; users wins.
        let entity = resolver().resolve("shared");
        assert_eq!(entity.kind, Some(EntityKind::User));
        assert_eq!(entity.descriptor, "User Shared");
    }

    #[test]
    fn test_unknown_token_yields_fallback() {
        let entity = resolver().resolve("ghost");
        assert!(!entity.is_resolved());
        assert_eq!(entity.descriptor, "ghost");
        assert_eq!(entity.jid, "ghost");
        assert_eq!(entity.id, None);
    }

    #[test]
    fn test_resolve_all_preserves_input_order() {
        let entities = resolver().resolve_all(["f1", "ghost", "u1"]);
        let descriptors: Vec<&str> = entities.iter().map(|e| e.descriptor.as_str()).collect();
        assert_eq!(descriptors, vec!["Announcements", "ghost", "Uma"]);
    }

    #[test]
    fn test_segment_names() {
        assert_eq!(EntityKind::User.segment(), "users");
        assert_eq!(EntityKind::Team.segment(), "teams");
        assert_eq!(EntityKind::Forum.segment(), "forums");
    }
}
