//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::app::coordinator::SyncMode;
use crate::config::ExchangeMode;
use crate::sync::session::SessionState;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Periodic status snapshot.
    Status(StatusReport),

    /// The server session moved between states.
    SessionChanged { from: SessionState, to: SessionState },

    /// The server switched the data-exchange direction.
    ModeChanged { from: SyncMode, to: SyncMode },

    /// The pump output changed level.
    PumpChanged(bool),

    /// The feed gate opened or closed.
    DispenserChanged(bool),

    /// One frame of the "waiting for link" animation.
    LinkWaiting(String),

    /// The application service has started.
    Started,
}

/// A point-in-time status snapshot suitable for logging or display.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub water_level_pct: Option<u8>,
    pub pump_on: bool,
    pub dispenser_open: bool,
    pub link_up: bool,
    pub session: SessionState,
    pub exchange_mode: ExchangeMode,
    pub sync_mode: SyncMode,
}
