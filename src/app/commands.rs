//! Inbound commands to the application service.
//!
//! These represent actions requested by the override console that the
//! [`PowerMonitor`](super::service::PowerMonitor) (or the main loop, for
//! the dump commands) interprets and acts upon.

/// Commands that the serial console can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Assert the OFF line immediately, regardless of button state.
    ForcePowerDown,

    /// Engage the stuck-firmware test mode: the monitor stops polling so
    /// the latch's hardware long-press override can be exercised.
    SimulateStuck,

    /// Emit a telemetry snapshot now (JSON line).
    ReportTelemetry,

    /// Dump the live configuration (JSON line).
    DumpConfig,

    /// Dump the state-transition log.
    DumpDiagnostics,

    /// Persist the live configuration to NVS.
    SaveConfig,
}

impl AppCommand {
    /// Map a console byte to a command.  Unknown bytes are ignored by the
    /// caller (returns `None`).
    pub fn from_console_byte(byte: u8) -> Option<Self> {
        match byte {
            b'p' => Some(Self::ForcePowerDown),
            b'h' => Some(Self::SimulateStuck),
            b't' => Some(Self::ReportTelemetry),
            b'c' => Some(Self::DumpConfig),
            b'd' => Some(Self::DumpDiagnostics),
            b's' => Some(Self::SaveConfig),
            _ => None,
        }
    }
}
