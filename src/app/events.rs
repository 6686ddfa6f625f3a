//! Outbound application events.
//!
//! The [`PowerMonitor`](super::service::PowerMonitor) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them — log to serial, record in a test
//! harness, etc.

use serde::Serialize;

use crate::fsm::StateId;
use crate::fsm::context::Action;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// A poll tick produced a non-trivial action.
    PowerAction(Action),

    /// The monitor has started (carries initial state).
    Started(StateId),

    /// The stuck-firmware test mode was engaged; polling has stopped.
    StuckModeEngaged,
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
/// Serialized to a JSON line by the console `t` command.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryData {
    pub state: StateId,
    pub uptime_ms: u32,
    pub button_pressed: bool,
    pub held_ms: u32,
    pub off_asserted: bool,
    pub total_ticks: u64,
}
