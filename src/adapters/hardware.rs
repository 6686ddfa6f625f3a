//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the output drivers and the button sense line, exposing them
//! through [`InputPort`] and [`PowerRailPort`].  This is the only module
//! in the system that touches actual pin levels.  On non-espidf targets,
//! the underlying drivers use the in-memory pin register.

use crate::app::ports::{InputPort, PowerRailPort};
use crate::drivers::hw_init;
use crate::drivers::off_line::OffLine;
use crate::drivers::status_led::StatusLed;
use crate::fsm::context::LineState;
use crate::pins;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    off_line: OffLine,
    led: StatusLed,
}

impl HardwareAdapter {
    pub fn new(off_line: OffLine, led: StatusLed) -> Self {
        Self { off_line, led }
    }
}

// ── InputPort implementation ──────────────────────────────────

impl InputPort for HardwareAdapter {
    fn read_button(&mut self) -> LineState {
        // Active-low: the pull-up keeps the line high until the switch
        // shorts it to ground.
        LineState::from_level(hw_init::gpio_read(pins::BUTTON_GPIO))
    }
}

// ── PowerRailPort implementation ──────────────────────────────

impl PowerRailPort for HardwareAdapter {
    fn assert_power_off(&mut self) {
        self.off_line.assert_off();
    }

    fn is_off_asserted(&self) -> bool {
        self.off_line.is_asserted()
    }

    fn set_status_led(&mut self, on: bool) {
        self.led.set(on);
    }
}
