//! # chatwire
//!
//! Wire-protocol types for the chatwatch daemon: inbound event frames,
//! outbound auth/presence frames, the Info entity directory, and
//! per-conversation read-state ("tabs").
//!
//! This crate is I/O free. The daemon owns all sockets and HTTP; everything
//! here is plain data with serde derives, so it can be exercised in tests
//! without a live service.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod directory;
pub mod error;
pub mod event;
pub mod frame;
pub mod info;
pub mod tabs;

pub use directory::{Entity, EntityKind, Resolver};
pub use error::ProtoError;
pub use event::{ChatMessage, ChatRevision, CreateSource, Event, PresenceUpdate, TypingNotice};
pub use frame::{Frame, Presence};
pub use info::{EntityRecord, Info, InfoEnvelope, Me};
pub use tabs::{unread_tabs, TabState, TabStateEnvelope};
