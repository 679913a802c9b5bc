//! Inbound event classification and dispatch.
//!
//! Each frame off the socket is classified by its type tag and routed to a
//! per-type handler. Handlers update session state, persist through the
//! store, and raise alerts; they run to completion before the next event is
//! processed.

use crate::alert::{AlertMetadata, Notifier};
use crate::api::ChatApi;
use crate::session::{PresenceEntry, Session};
use crate::store::Store;
use crate::surface::Indicator;
use crate::unread;
use chatwire::event::{ChatMessage, PresenceUpdate, TypingNotice};
use chatwire::{Event, Frame, Presence, Resolver};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Everything a handler may touch, borrowed from the watcher for the
/// duration of one event.
pub struct RouterCtx<'a> {
    pub session: &'a mut Session,
    pub store: &'a dyn Store,
    pub notifier: &'a Notifier,
    pub indicator: &'a dyn Indicator,
    pub api: &'a dyn ChatApi,
    pub organization: &'a str,
    pub outbound: &'a mpsc::Sender<Frame>,
}

/// Routes inbound events to their per-type handlers.
///
/// Holds the resolver built for the current connection attempt; a reconnect
/// constructs a fresh router over the new snapshot.
pub struct Router {
    resolver: Resolver,
}

impl Router {
    pub fn new(resolver: Resolver) -> Self {
        Self { resolver }
    }

    /// Dispatch one inbound event.
    pub async fn dispatch(&self, ctx: &mut RouterCtx<'_>, event: Event) {
        match event {
            Event::Ack => self.on_ack(ctx).await,
            Event::PresenceChange(update) => self.on_presence(ctx, update).await,
            Event::UserTyping(notice) => self.on_typing(ctx, notice).await,
            Event::Chat(message) => self.on_chat(ctx, message).await,
            Event::ChatDeleted(_) | Event::ChatUpdated(_) => self.on_revision(ctx, event).await,
            // Service-side bookkeeping; accepted silently.
            Event::Service => {}
            Event::Unknown { kind, raw } => self.on_unknown(ctx, &kind, &raw).await,
        }
    }

    /// The remote acknowledged authentication: the connection counts as
    /// open from here.
    async fn on_ack(&self, ctx: &mut RouterCtx<'_>) {
        info!("Authenticated");
        ctx.store.clear_retry_count().await;
        ctx.notifier.clear_reconnect();
        ctx.indicator.set_badge("");
        ctx.indicator.set_title("Connected");

        if ctx
            .outbound
            .send(Frame::presence(Presence::Unavailable))
            .await
            .is_err()
        {
            warn!("Outbound channel closed before presence announcement");
        }

        if let Err(e) = unread::check(ctx.api, ctx.organization, ctx.store, ctx.notifier).await {
            warn!(error = %e, "Unread-tabs check failed");
            ctx.notifier.error(&e.to_string());
        }
    }

    async fn on_presence(&self, ctx: &mut RouterCtx<'_>, update: PresenceUpdate) {
        let from = self.resolver.resolve(&update.from);
        debug!(
            who = %from.descriptor,
            presence = %update.presence,
            client = ?update.client,
            "Presence change"
        );
        ctx.session.update_presence(
            update.from.clone(),
            PresenceEntry {
                descriptor: from.descriptor.clone(),
                presence: update.presence.clone(),
                received: update.received,
                entity: from,
            },
        );
        ctx.store.put_presence(ctx.session.presence()).await;
    }

    async fn on_typing(&self, ctx: &mut RouterCtx<'_>, notice: TypingNotice) {
        let (from, to) = self.resolver.resolve_pair(&notice.from, &notice.to);
        let title = format!("{} ➔ {}", from.descriptor, to.descriptor);
        let body = format!("user_typing : {}", notice.state.clone().unwrap_or_default());
        let icon = from.avatar_url.clone();
        debug!(from = %from.descriptor, to = %to.descriptor, "Typing");

        self.log_and_badge(ctx, Event::UserTyping(notice)).await;
        ctx.notifier
            .message(title, body, icon, AlertMetadata { from, to })
            .await;
    }

    async fn on_chat(&self, ctx: &mut RouterCtx<'_>, message: ChatMessage) {
        let (from, to) = self.resolver.resolve_pair(&message.from, &message.to);
        // A bridged source may override the sender's display name and
        // avatar. The override applies to alert rendering only; the stored
        // log entry keeps the raw event.
        let display_from = message
            .create_source
            .as_ref()
            .and_then(|source| source.display_name.clone())
            .unwrap_or_else(|| from.descriptor.clone());
        let icon = message
            .create_source
            .as_ref()
            .and_then(|source| source.avatar.clone())
            .or_else(|| from.avatar_url.clone());
        let title = format!("{display_from} ➔ {}", to.descriptor);
        let body = message.text.clone();
        debug!(from = %from.descriptor, to = %to.descriptor, text = %message.text, "Chat");

        self.log_and_badge(ctx, Event::Chat(message)).await;
        ctx.notifier
            .message(title, body, icon, AlertMetadata { from, to })
            .await;
    }

    /// Edits and deletions are appended to the log as history, never merged
    /// into prior entries, and raise no alert.
    async fn on_revision(&self, ctx: &mut RouterCtx<'_>, event: Event) {
        debug!(kind = %event.kind(), "Chat revision");
        self.log_and_badge(ctx, event).await;
    }

    /// Deliberate fallback: protocol evolution on the remote side must not
    /// silently drop user-visible activity.
    async fn on_unknown(&self, ctx: &mut RouterCtx<'_>, kind: &str, raw: &str) {
        warn!(kind = %kind, "Unhandled event type");
        ctx.notifier.protocol_surprise(kind, raw);
    }

    async fn log_and_badge(&self, ctx: &mut RouterCtx<'_>, event: Event) {
        let unread = ctx.session.record(event);
        ctx.store.put_chat_log(ctx.session.chat_log()).await;
        ctx.indicator.set_badge(&unread.to_string());
    }
}
