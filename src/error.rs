//! Error taxonomy for the watcher.
//!
//! Configuration and transport failures surface an interactive error alert
//! and never touch the retry counter; only socket-level closures engage the
//! bounded retry policy in the connection watcher.

use thiserror::Error;

/// Failures of a connection attempt or a service query.
#[derive(Debug, Error)]
pub enum WatchError {
    /// No organization configured; needs user action, never retried.
    #[error("no organization configured")]
    MissingOrganization,

    /// Session credentials absent or unusable.
    #[error("session credentials missing or invalid")]
    MissingCredentials,

    /// The service answered outside the success range.
    #[error("{0} returned status {1}")]
    Status(&'static str, reqwest::StatusCode),

    /// Network-level request failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a body we could not decode.
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Failure establishing or writing the chat socket.
    #[error("websocket failure: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Outbound frame could not be encoded.
    #[error(transparent)]
    Proto(#[from] chatwire::ProtoError),
}
