//! External control events and the system-state monitor.
//!
//! The watcher reacts to five external event sources: process startup,
//! system activity transitions, configuration reloads, socket lifecycle
//! events, and alert clicks. Everything except the socket arrives here.

use crate::config::Config;

/// System activity, as reported by the platform monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityState {
    Active,
    Idle,
    Locked,
}

/// Snapshot of the system conditions relevant to reconnecting.
#[derive(Debug, Clone, Copy)]
pub struct SystemState {
    pub online: bool,
    pub activity: ActivityState,
}

impl SystemState {
    pub fn is_active(&self) -> bool {
        matches!(self.activity, ActivityState::Active)
    }
}

/// Supplies the current system state to the retry policy.
pub trait SystemMonitor: Send + Sync {
    fn state(&self) -> SystemState;
}

/// Monitor for platforms without idle or connectivity reporting: always
/// active, always online.
pub struct AlwaysOn;

impl SystemMonitor for AlwaysOn {
    fn state(&self) -> SystemState {
        SystemState {
            online: true,
            activity: ActivityState::Active,
        }
    }
}

/// One external event delivered to the watcher's control channel.
#[derive(Debug)]
pub enum ControlEvent {
    /// The system transitioned between active, idle, and locked.
    Activity(ActivityState),
    /// The configuration file was reloaded.
    ConfigReloaded(Config),
    /// The user clicked an alert.
    AlertClicked(String),
    /// The local activity view was opened; unread resets to zero.
    Viewed,
    /// Terminate the watcher.
    Shutdown,
}
