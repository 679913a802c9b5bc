//! chatwatchd - desktop-alert watcher for a hosted team-chat service.
//!
//! Maintains one WebSocket connection to the service, mirrors activity into
//! a local state file, and raises alerts for new messages and unread
//! conversations.

use chatwatch::alert::{LogSink, Notifier};
use chatwatch::api::ApiClient;
use chatwatch::config::Config;
use chatwatch::control::{AlwaysOn, ControlEvent};
use chatwatch::store::JsonStore;
use chatwatch::surface::{LogIndicator, LogOpener};
use chatwatch::watcher::{Watcher, WatcherParams};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "chatwatch.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        organization = ?config.organization,
        domain = %config.service.domain,
        "Starting chatwatchd"
    );

    let store = Arc::new(JsonStore::open(&config.store.path));
    let api = Arc::new(ApiClient::new(&config.service, &config.auth)?);
    let notifier = Notifier::new(Box::new(LogSink), store.clone());

    let (control_tx, control_rx) = mpsc::channel(16);

    // SIGHUP reloads the config file; an organization change forces a
    // close-then-reconnect.
    #[cfg(unix)]
    {
        let tx = control_tx.clone();
        let path = config_path.clone();
        tokio::spawn(async move {
            let Ok(mut hangup) =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup())
            else {
                return;
            };
            while hangup.recv().await.is_some() {
                match Config::load(&path) {
                    Ok(reloaded) => {
                        info!("Configuration reloaded");
                        if tx.send(ControlEvent::ConfigReloaded(reloaded)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Reload failed, keeping previous configuration");
                    }
                }
            }
        });
    }

    {
        let tx = control_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(ControlEvent::Shutdown).await;
            }
        });
    }

    let watcher = Watcher::new(WatcherParams {
        config,
        api,
        store,
        notifier,
        indicator: Box::new(LogIndicator),
        opener: Box::new(LogOpener),
        monitor: Box::new(AlwaysOn),
        control: control_rx,
    });

    watcher.run().await
}
