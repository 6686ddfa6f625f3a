//! Status LED driver.
//!
//! A single indicator on the latch header, lit while the system
//! considers itself "on".
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the GPIO via hw_init.
//! On host/test: writes the in-memory pin register.

use crate::drivers::hw_init;
use crate::pins;

pub struct StatusLed {
    on: bool,
}

impl StatusLed {
    pub fn new() -> Self {
        Self { on: false }
    }

    pub fn set(&mut self, on: bool) {
        hw_init::gpio_write(pins::STATUS_LED_GPIO, on);
        self.on = on;
    }

    pub fn off(&mut self) {
        self.set(false);
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_tracks_and_drives_the_pin() {
        let mut led = StatusLed::new();
        led.set(true);
        assert!(led.is_on());
        assert!(hw_init::gpio_read(pins::STATUS_LED_GPIO));
        led.off();
        assert!(!led.is_on());
        assert!(!hw_init::gpio_read(pins::STATUS_LED_GPIO));
    }
}
