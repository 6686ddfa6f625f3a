//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! The test suites substitute a recording sink behind the same trait.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | state={:?} | up={}ms | btn={} held={}ms | off={} | ticks={}",
                    t.state,
                    t.uptime_ms,
                    if t.button_pressed { "DOWN" } else { "UP" },
                    t.held_ms,
                    t.off_asserted,
                    t.total_ticks,
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::PowerAction(action) => {
                info!("ACTION | {:?}", action);
            }
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::StuckModeEngaged => {
                info!("STUCK | polling halted for override test");
            }
        }
    }
}
