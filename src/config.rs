//! Configuration loading and reload handling.
//!
//! The organization is the only setting that forces a reconnect when it
//! changes; everything else applies on the next connection attempt.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Watcher configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Tenant of the hosted service to connect to. Connecting without one
    /// is a configuration error surfaced to the user, never retried.
    #[serde(default)]
    pub organization: Option<String>,
    /// Remote service endpoints and client identity.
    #[serde(default)]
    pub service: ServiceConfig,
    /// Session credentials.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Reconnect policy tunables.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Local state persistence.
    #[serde(default)]
    pub store: StoreConfig,
}

/// Remote service endpoints and the static client identity.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Tenant domain suffix; the API lives at `https://{org}.{domain}`.
    #[serde(default = "default_domain")]
    pub domain: String,
    /// Fixed chat socket endpoint.
    #[serde(default = "default_chat_url")]
    pub chat_url: String,
    /// Agent name sent in the auth frame.
    #[serde(default = "default_agent")]
    pub agent: String,
    /// Static resource identifier sent in the auth frame.
    #[serde(default = "default_resource")]
    pub resource: String,
}

/// Session credentials, the daemon's stand-in for ambient browser cookies.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Cookie header value attached to API requests.
    #[serde(default)]
    pub cookie: Option<String>,
    /// Chat session token carried in the socket auth frame.
    #[serde(default)]
    pub session_token: Option<String>,
}

/// Reconnect policy tunables.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RetryConfig {
    /// Consecutive automatic reconnects allowed before prompting the user.
    #[serde(default = "default_retry_limit")]
    pub limit: u32,
    /// Require the system to be active (not idle) before auto-reconnecting.
    #[serde(default)]
    pub require_active: bool,
}

/// Local state persistence.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path of the JSON state file.
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_domain() -> String {
    "ryver.com".to_string()
}

fn default_chat_url() -> String {
    "wss://prdchat.ryver.com/apt38/1/ratatoskr".to_string()
}

fn default_agent() -> String {
    "Ryver".to_string()
}

fn default_resource() -> String {
    "Contatta-1496207329078".to_string()
}

fn default_retry_limit() -> u32 {
    2
}

fn default_store_path() -> String {
    "chatwatch-state.json".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            chat_url: default_chat_url(),
            agent: default_agent(),
            resource: default_resource(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            limit: default_retry_limit(),
            require_active: false,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
