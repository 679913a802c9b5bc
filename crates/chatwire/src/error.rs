//! Protocol error types.

use thiserror::Error;

/// Errors raised while decoding wire frames.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// The frame was not valid JSON, or a payload field had the wrong shape.
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),

    /// The frame carried no `type` discriminator.
    #[error("frame is missing a type discriminator")]
    MissingType,
}
