//! Connection lifecycle: the single live socket, authentication, and the
//! bounded reconnect policy.
//!
//! State machine: `IDLE → CONNECTING → OPEN → CLOSED → (CONNECTING | TERMINAL)`.
//! A close event always fully resets shared session state before any
//! reconnect attempt begins, so a new connection never observes stale
//! entities, chat log entries, or presence from the previous session.
//! Reset-first is also what makes repeated reconnect clicks harmless.

use crate::alert::{ClickAction, Notifier};
use crate::api::ChatApi;
use crate::config::{Config, RetryConfig};
use crate::control::{ActivityState, ControlEvent, SystemMonitor, SystemState};
use crate::error::WatchError;
use crate::router::{Router, RouterCtx};
use crate::session::Session;
use crate::store::Store;
use crate::surface::{Indicator, UrlOpener};
use chatwire::{Event, Frame, Resolver};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Pause between automatic reconnection attempts.
const RETRY_DELAY: std::time::Duration = std::time::Duration::from_secs(1);

/// Outcome of a close event under the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Reconnect immediately, persisting the incremented counter.
    Retry {
        /// Counter value to persist before the attempt.
        next_count: u32,
    },
    /// Stop auto-retrying and prompt the user.
    Prompt,
    /// Stay closed; a later activity transition may trigger reconnection.
    Hold,
}

/// Bounded automatic-reconnect policy.
///
/// The counter persists across process restarts and is cleared only by a
/// successful open, so a flapping connection cannot retry forever.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub limit: u32,
    pub require_active: bool,
}

impl RetryPolicy {
    pub fn from_config(retry: &RetryConfig) -> Self {
        Self {
            limit: retry.limit,
            require_active: retry.require_active,
        }
    }

    /// Decide what to do after an unexpected close.
    pub fn on_close(&self, system: SystemState, retries: u32) -> RetryDecision {
        if !system.online || (self.require_active && !system.is_active()) {
            return RetryDecision::Hold;
        }
        if retries < self.limit {
            RetryDecision::Retry {
                next_count: retries + 1,
            }
        } else {
            RetryDecision::Prompt
        }
    }
}

/// What the event loop does next.
enum Phase {
    Connect,
    Idle,
    Stop,
}

/// One completed `select!` round in the open loop.
enum Step {
    Inbound(Option<Result<WsMessage, tokio_tungstenite::tungstenite::Error>>),
    Outbound(Frame),
    Control(Option<ControlEvent>),
}

/// Collaborators handed to [`Watcher::new`].
pub struct WatcherParams {
    pub config: Config,
    pub api: Arc<dyn ChatApi>,
    pub store: Arc<dyn Store>,
    pub notifier: Notifier,
    pub indicator: Box<dyn Indicator>,
    pub opener: Box<dyn UrlOpener>,
    pub monitor: Box<dyn SystemMonitor>,
    pub control: mpsc::Receiver<ControlEvent>,
}

/// Owns the single live connection and all session state.
pub struct Watcher {
    config: Config,
    api: Arc<dyn ChatApi>,
    store: Arc<dyn Store>,
    notifier: Notifier,
    indicator: Box<dyn Indicator>,
    opener: Box<dyn UrlOpener>,
    monitor: Box<dyn SystemMonitor>,
    session: Session,
    control: mpsc::Receiver<ControlEvent>,
}

impl Watcher {
    pub fn new(params: WatcherParams) -> Self {
        Self {
            config: params.config,
            api: params.api,
            store: params.store,
            notifier: params.notifier,
            indicator: params.indicator,
            opener: params.opener,
            monitor: params.monitor,
            session: Session::new(),
            control: params.control,
        }
    }

    /// Run until shutdown.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut phase = if self.monitor.state().online {
            Phase::Connect
        } else {
            Phase::Idle
        };
        loop {
            phase = match phase {
                Phase::Connect => self.attempt().await,
                Phase::Idle => self.idle().await,
                Phase::Stop => break,
            };
        }
        info!("Watcher stopped");
        Ok(())
    }

    /// One CONNECTING attempt plus, on success, the open loop.
    async fn attempt(&mut self) -> Phase {
        self.hard_reset().await;
        match self.connect_and_drive().await {
            Ok(phase) => phase,
            Err(e) => {
                // Configuration and transport failures never engage the
                // retry counter; they need user attention.
                warn!(error = %e, "Connection attempt failed");
                self.notifier.error(&e.to_string());
                Phase::Idle
            }
        }
    }

    async fn connect_and_drive(&mut self) -> Result<Phase, WatchError> {
        let organization = self
            .config
            .organization
            .clone()
            .ok_or(WatchError::MissingOrganization)?;
        let token = self
            .config
            .auth
            .session_token
            .clone()
            .ok_or(WatchError::MissingCredentials)?;

        info!(organization = %organization, "Connecting");
        let info = Arc::new(self.api.fetch_info(&organization).await?);
        self.store.put_info(Some(&organization), Some(&info)).await;
        self.session.install_info(Arc::clone(&info));
        let resolver = Resolver::new(info);

        let (mut socket, _) =
            tokio_tungstenite::connect_async(self.config.service.chat_url.as_str()).await?;

        // Fire-and-forget: the handshake counts as complete only when the
        // ack event comes back through the router.
        let auth = Frame::auth(
            &token,
            &self.config.service.agent,
            &self.config.service.resource,
        );
        socket.send(WsMessage::Text(auth.to_text()?)).await?;

        Ok(self.drive(socket, resolver, organization).await)
    }

    /// The open loop: socket frames, outbound frames, and control events.
    async fn drive(&mut self, socket: WsStream, resolver: Resolver, organization: String) -> Phase {
        let (mut writer, mut reader) = socket.split();
        let (out_tx, mut out_rx) = mpsc::channel::<Frame>(16);
        let router = Router::new(resolver);

        loop {
            let step = tokio::select! {
                frame = reader.next() => Step::Inbound(frame),
                Some(frame) = out_rx.recv() => Step::Outbound(frame),
                event = self.control.recv() => Step::Control(event),
            };

            match step {
                Step::Inbound(Some(Ok(WsMessage::Text(text)))) => {
                    debug!(raw = %text, "Frame received");
                    match Event::parse(&text) {
                        Ok(event) => {
                            let mut ctx = RouterCtx {
                                session: &mut self.session,
                                store: self.store.as_ref(),
                                notifier: &self.notifier,
                                indicator: self.indicator.as_ref(),
                                api: self.api.as_ref(),
                                organization: &organization,
                                outbound: &out_tx,
                            };
                            router.dispatch(&mut ctx, event).await;
                        }
                        Err(e) => warn!(error = %e, "Undecodable frame"),
                    }
                }
                Step::Inbound(Some(Ok(WsMessage::Close(_)))) => {
                    return self.on_close().await;
                }
                // Ping/pong and binary frames are transport noise.
                Step::Inbound(Some(Ok(_))) => {}
                Step::Inbound(Some(Err(e))) => {
                    warn!(error = %e, "Socket error");
                    return self.on_close().await;
                }
                Step::Inbound(None) => {
                    return self.on_close().await;
                }
                Step::Outbound(frame) => match frame.to_text() {
                    Ok(text) => {
                        if let Err(e) = writer.send(WsMessage::Text(text)).await {
                            warn!(error = %e, "Socket write failed");
                            return self.on_close().await;
                        }
                    }
                    Err(e) => warn!(error = %e, "Frame encode failed"),
                },
                Step::Control(None) | Step::Control(Some(ControlEvent::Shutdown)) => {
                    let _ = writer.send(WsMessage::Close(None)).await;
                    return Phase::Stop;
                }
                Step::Control(Some(ControlEvent::ConfigReloaded(new))) => {
                    // The organization is the one setting that forces a
                    // close-then-reconnect regardless of current state.
                    let changed = new.organization != self.config.organization;
                    self.config = new;
                    if changed {
                        info!(organization = ?self.config.organization, "Organization changed, reconnecting");
                        let _ = writer.send(WsMessage::Close(None)).await;
                        return Phase::Connect;
                    }
                }
                Step::Control(Some(ControlEvent::AlertClicked(id))) => {
                    // A reconnect request is meaningless while open.
                    let _ = self.handle_click(&id).await;
                }
                Step::Control(Some(ControlEvent::Viewed)) => {
                    self.session.mark_viewed();
                    self.indicator.set_badge("");
                }
                // Activity transitions are ignored while a connection is
                // open.
                Step::Control(Some(ControlEvent::Activity(_))) => {}
            }
        }
    }

    /// CLOSED: hard-reset shared state, then decide between immediate
    /// reconnection and the terminal prompt.
    async fn on_close(&mut self) -> Phase {
        info!("Socket closed");
        self.hard_reset().await;

        let policy = RetryPolicy::from_config(&self.config.retry);
        let retries = self.store.retry_count().await;
        match policy.on_close(self.monitor.state(), retries) {
            RetryDecision::Retry { next_count } => {
                info!(attempt = next_count, limit = policy.limit, "Retrying");
                self.store.set_retry_count(next_count).await;
                tokio::time::sleep(RETRY_DELAY).await;
                Phase::Connect
            }
            RetryDecision::Prompt => {
                info!("Retry limit reached, prompting");
                self.notifier.reconnect_prompt();
                Phase::Idle
            }
            RetryDecision::Hold => Phase::Idle,
        }
    }

    /// Reset invariant: session state is cleared and the disconnected
    /// indicator shown before any reconnect path may begin.
    async fn hard_reset(&mut self) {
        self.session.reset();
        self.store
            .put_info(self.config.organization.as_deref(), None)
            .await;
        self.store.put_chat_log(&[]).await;
        self.store.put_presence(&Default::default()).await;
        self.indicator.set_badge("!");
        self.indicator.set_title("Disconnected");
    }

    /// IDLE/TERMINAL: wait for an external trigger.
    async fn idle(&mut self) -> Phase {
        loop {
            let Some(event) = self.control.recv().await else {
                return Phase::Stop;
            };
            match event {
                ControlEvent::Shutdown => return Phase::Stop,
                ControlEvent::Activity(state) => {
                    // Waking to an active system with network available
                    // re-enters CONNECTING.
                    if state == ActivityState::Active && self.monitor.state().online {
                        return Phase::Connect;
                    }
                }
                ControlEvent::ConfigReloaded(new) => {
                    let changed = new.organization != self.config.organization;
                    self.config = new;
                    if changed && self.config.organization.is_some() {
                        return Phase::Connect;
                    }
                }
                ControlEvent::AlertClicked(id) => {
                    if let Some(phase) = self.handle_click(&id).await {
                        return phase;
                    }
                }
                ControlEvent::Viewed => {
                    self.session.mark_viewed();
                    self.indicator.set_badge("");
                }
            }
        }
    }

    /// Route an alert click. Returns the next phase when the click demands
    /// a reconnection; the retry counter is deliberately left alone, it is
    /// cleared only by a later successful open.
    async fn handle_click(&mut self, id: &str) -> Option<Phase> {
        let organization = self.config.organization.clone().unwrap_or_default();
        let me = self.session.info().map(|info| info.me.id);
        match self
            .notifier
            .click(id, &self.config.service.domain, &organization, me)
            .await
        {
            ClickAction::Open(url) => {
                self.opener.open(&url);
                None
            }
            ClickAction::Reconnect => Some(Phase::Connect),
        }
    }
}
