//! Serial override console adapter.
//!
//! A deliberately tiny textual interface on UART0 for bring-up and
//! override testing: one byte in, one command out.  Not part of the core
//! contract — production boards ship with the header unpopulated.
//!
//! On ESP-IDF the UART driver is polled with a zero timeout so the main
//! loop never blocks.  On host targets, tests inject bytes directly.

use log::info;

use crate::app::commands::AppCommand;
#[cfg(target_os = "espidf")]
use crate::error::Error;
use crate::error::Result;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
const CONSOLE_UART: uart_port_t = 0; // UART0 — shared with the boot log
#[cfg(target_os = "espidf")]
const RX_BUFFER_BYTES: i32 = 256;

pub struct ConsoleAdapter {
    #[cfg(not(target_os = "espidf"))]
    injected: std::collections::VecDeque<u8>,
}

impl ConsoleAdapter {
    /// Bring up the console.  On ESP-IDF this installs the UART driver;
    /// failure is reported but non-fatal to the caller (the monitor runs
    /// fine without a console).
    #[cfg(target_os = "espidf")]
    pub fn new() -> Result<Self> {
        // SAFETY: driver install happens once from the main task before
        // the event loop; reads below go through the installed driver.
        let ret = unsafe {
            uart_driver_install(
                CONSOLE_UART,
                RX_BUFFER_BYTES,
                0,
                0,
                core::ptr::null_mut(),
                0,
            )
        };
        if ret != ESP_OK {
            return Err(Error::Console("UART driver install failed"));
        }
        info!("console: listening on UART0 (p/h/t/c/d/s)");
        Ok(Self {})
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Result<Self> {
        info!("console(sim): byte-injection mode");
        Ok(Self {
            injected: std::collections::VecDeque::new(),
        })
    }

    /// Non-blocking read of one pending byte.
    #[cfg(target_os = "espidf")]
    pub fn poll_byte(&mut self) -> Option<u8> {
        let mut byte = 0u8;
        // SAFETY: one-byte buffer, zero-tick timeout — returns the number
        // of bytes actually read (0 when the FIFO is empty).
        let n = unsafe {
            uart_read_bytes(CONSOLE_UART, (&raw mut byte).cast(), 1, 0)
        };
        (n == 1).then_some(byte)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn poll_byte(&mut self) -> Option<u8> {
        self.injected.pop_front()
    }

    /// Poll for a complete command.  Unknown bytes are ignored (echoing a
    /// help line for every line-feed would spam the log).
    pub fn poll_command(&mut self) -> Option<AppCommand> {
        self.poll_byte().and_then(AppCommand::from_console_byte)
    }

    /// Test hook: queue a byte as if it arrived on the wire.
    #[cfg(not(target_os = "espidf"))]
    pub fn inject(&mut self, byte: u8) {
        self.injected.push_back(byte);
    }
}
