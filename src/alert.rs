//! The alert surface: platform notification collaborator, per-alert click
//! metadata, and click routing.
//!
//! The sink returns each alert's identifier synchronously; recording click
//! metadata is an explicit next step, so there is no callback-order
//! ambiguity between creating an alert and binding its metadata.

use crate::api;
use crate::store::Store;
use chatwire::{Entity, EntityKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Identifier of the singleton "reconnect?" alert.
pub const RECONNECT_ALERT: &str = "reconnect";
/// Identifier of the singleton unread-tabs alert.
pub const UNREAD_TABS_ALERT: &str = "unreadTabs";
/// Identifier of the singleton connection-error alert.
pub const ERROR_ALERT: &str = "error";

/// A user-visible alert.
#[derive(Debug, Clone)]
pub struct Alert {
    /// Explicit identifier for singleton alerts; generated when `None`.
    pub id: Option<String>,
    pub title: String,
    pub body: String,
    /// Icon reference; the sink applies its default when absent.
    pub icon: Option<String>,
    /// Keep the alert on screen until the user acts on it.
    pub interactive: bool,
}

/// Platform alert surface.
///
/// `show` must return the alert's stable identifier synchronously so the
/// caller can bind click metadata to it.
pub trait AlertSink: Send + Sync {
    fn show(&self, alert: Alert) -> String;
    fn clear(&self, id: &str);
}

/// Tracing-backed sink used when no desktop integration is wired in.
pub struct LogSink;

impl AlertSink for LogSink {
    fn show(&self, alert: Alert) -> String {
        let id = alert.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        info!(id = %id, title = %alert.title, body = %alert.body, "alert");
        id
    }

    fn clear(&self, id: &str) {
        info!(id = %id, "alert cleared");
    }
}

/// The resolved {from, to} pair behind a per-message alert, consulted when
/// the user clicks it. Entries accumulate for the session lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertMetadata {
    pub from: Entity,
    pub to: Entity,
}

/// What a click on an alert should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// Open a conversation or landing page.
    Open(String),
    /// Re-attempt the connection.
    Reconnect,
}

/// Navigation target for a per-message alert: the recipient when the
/// conversation lives on the recipient's page (team or forum recipient, or
/// the sender is the local user), otherwise the sender.
pub fn destination<'a>(metadata: &'a AlertMetadata, me: Option<i64>) -> &'a Entity {
    let to_recipient = matches!(
        metadata.to.kind,
        Some(EntityKind::Team | EntityKind::Forum)
    ) || (metadata.from.id.is_some() && metadata.from.id == me);
    if to_recipient {
        &metadata.to
    } else {
        &metadata.from
    }
}

/// Wraps the platform sink with defaults and stable identifiers.
pub struct Notifier {
    sink: Box<dyn AlertSink>,
    store: Arc<dyn Store>,
}

impl Notifier {
    pub fn new(sink: Box<dyn AlertSink>, store: Arc<dyn Store>) -> Self {
        Self { sink, store }
    }

    /// Raise a per-message alert and bind the resolved pair to the
    /// generated identifier.
    pub async fn message(
        &self,
        title: String,
        body: String,
        icon: Option<String>,
        metadata: AlertMetadata,
    ) -> String {
        let id = self.sink.show(Alert {
            id: None,
            title,
            body,
            icon,
            interactive: false,
        });
        self.store.put_alert_metadata(&id, &metadata).await;
        id
    }

    /// Interactive error alert for a failed connection attempt or query.
    pub fn error(&self, message: &str) {
        self.sink.show(Alert {
            id: Some(ERROR_ALERT.to_string()),
            title: "Error".to_string(),
            body: message.to_string(),
            icon: None,
            interactive: true,
        });
    }

    /// Persistent "reconnect?" prompt once automatic retries are exhausted.
    pub fn reconnect_prompt(&self) {
        self.sink.show(Alert {
            id: Some(RECONNECT_ALERT.to_string()),
            title: "Disconnected".to_string(),
            body: "Reconnect?".to_string(),
            icon: None,
            interactive: true,
        });
    }

    pub fn clear_reconnect(&self) {
        self.sink.clear(RECONNECT_ALERT);
    }

    /// Replace the singleton unread-tabs alert.
    pub fn unread_tabs(&self, count: usize, body: &str) {
        self.sink.clear(UNREAD_TABS_ALERT);
        self.sink.show(Alert {
            id: Some(UNREAD_TABS_ALERT.to_string()),
            title: format!("{count} unread"),
            body: body.to_string(),
            icon: None,
            interactive: true,
        });
    }

    pub fn clear_unread_tabs(&self) {
        self.sink.clear(UNREAD_TABS_ALERT);
    }

    /// Low-severity alert for an event type outside the closed set.
    pub fn protocol_surprise(&self, kind: &str, raw: &str) {
        self.sink.show(Alert {
            id: None,
            title: format!("unhandled event: {kind}"),
            body: raw.to_string(),
            icon: None,
            interactive: false,
        });
    }

    /// Resolve a click on any alert to its action.
    pub async fn click(
        &self,
        id: &str,
        domain: &str,
        organization: &str,
        me: Option<i64>,
    ) -> ClickAction {
        if id == RECONNECT_ALERT {
            self.sink.clear(RECONNECT_ALERT);
            return ClickAction::Reconnect;
        }
        if id == UNREAD_TABS_ALERT {
            self.sink.clear(UNREAD_TABS_ALERT);
            let tabs = self.store.unread_tabs().await;
            return match tabs.first() {
                Some(tab) => ClickAction::Open(api::entity_url(
                    domain,
                    organization,
                    tab.entity.kind(),
                    tab.entity.id,
                )),
                None => ClickAction::Open(api::root_url(domain, organization)),
            };
        }
        match self.store.alert_metadata(id).await {
            Some(metadata) => {
                let target = destination(&metadata, me);
                match (target.kind, target.id) {
                    (Some(kind), Some(entity_id)) => {
                        ClickAction::Open(api::entity_url(domain, organization, kind, entity_id))
                    }
                    _ => ClickAction::Open(api::root_url(domain, organization)),
                }
            }
            None => ClickAction::Open(api::root_url(domain, organization)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(kind: Option<EntityKind>, id: i64, descriptor: &str) -> Entity {
        Entity {
            kind,
            id: Some(id),
            jid: descriptor.to_lowercase(),
            descriptor: descriptor.to_string(),
            avatar_url: None,
        }
    }

    #[test]
    fn test_destination_team_recipient_wins() {
        let metadata = AlertMetadata {
            from: entity(Some(EntityKind::User), 2, "Viktor"),
            to: entity(Some(EntityKind::Team), 10, "Platform"),
        };
        assert_eq!(destination(&metadata, Some(1)).descriptor, "Platform");
    }

    #[test]
    fn test_destination_forum_recipient_wins() {
        let metadata = AlertMetadata {
            from: entity(Some(EntityKind::User), 2, "Viktor"),
            to: entity(Some(EntityKind::Forum), 20, "Announcements"),
        };
        assert_eq!(destination(&metadata, Some(1)).descriptor, "Announcements");
    }

    #[test]
    fn test_destination_sender_is_me_goes_to_recipient() {
        let metadata = AlertMetadata {
            from: entity(Some(EntityKind::User), 1, "Me"),
            to: entity(Some(EntityKind::User), 3, "Carol"),
        };
        assert_eq!(destination(&metadata, Some(1)).descriptor, "Carol");
    }

    #[test]
    fn test_destination_defaults_to_sender() {
        let metadata = AlertMetadata {
            from: entity(Some(EntityKind::User), 2, "Viktor"),
            to: entity(Some(EntityKind::User), 1, "Me"),
        };
        assert_eq!(destination(&metadata, Some(1)).descriptor, "Viktor");
    }

    #[test]
    fn test_destination_without_me_identity() {
        let metadata = AlertMetadata {
            from: entity(Some(EntityKind::User), 2, "Viktor"),
            to: entity(Some(EntityKind::User), 3, "Carol"),
        };
        assert_eq!(destination(&metadata, None).descriptor, "Viktor");
    }
}
