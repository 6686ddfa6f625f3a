//! System configuration parameters
//!
//! All tunable parameters for the SoftLatch controller.
//! Values can be overridden via NVS (non-volatile storage) at manufacturing
//! time; the defaults match the LP-1 datasheet figures.

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Button timing ---
    /// Hold duration (ms) required at boot to confirm power-on.
    /// A release before this treats the wake as an accidental bump.
    pub power_on_confirm_ms: u32,
    /// Hold duration (ms) during normal operation that triggers power-down.
    pub power_down_hold_ms: u32,
    /// Settle interval (ms) before a raw level transition is re-sampled
    /// and accepted as real.
    pub debounce_settle_ms: u32,

    // --- Timing ---
    /// Control loop poll interval (milliseconds).
    pub control_loop_interval_ms: u32,
    /// Telemetry report interval (seconds).
    pub telemetry_interval_secs: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Button timing
            power_on_confirm_ms: 500,
            power_down_hold_ms: 2000,
            debounce_settle_ms: 20,

            // Timing
            control_loop_interval_ms: 10, // 100 Hz poll
            telemetry_interval_secs: 60,  // 1/min
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Returns the offending field's name on
    /// failure so `ConfigPort` implementations can reject bad blobs
    /// before persisting them.
    pub fn validate(&self) -> core::result::Result<(), &'static str> {
        if self.control_loop_interval_ms == 0 {
            return Err("control_loop_interval_ms must be non-zero");
        }
        if self.debounce_settle_ms < self.control_loop_interval_ms {
            return Err("debounce_settle_ms shorter than one poll tick");
        }
        if self.power_on_confirm_ms <= self.debounce_settle_ms {
            return Err("power_on_confirm_ms must exceed debounce_settle_ms");
        }
        if self.power_down_hold_ms <= self.power_on_confirm_ms {
            return Err("power_down_hold_ms must exceed power_on_confirm_ms");
        }
        if self.telemetry_interval_secs == 0 {
            return Err("telemetry_interval_secs must be non-zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = SystemConfig::default();
        assert!(c.validate().is_ok());
        assert!(c.power_down_hold_ms > c.power_on_confirm_ms);
        assert!(c.power_on_confirm_ms > c.debounce_settle_ms);
        assert!(c.control_loop_interval_ms > 0);
    }

    #[test]
    fn serde_roundtrip() {
        let c = SystemConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: SystemConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c.power_on_confirm_ms, c2.power_on_confirm_ms);
        assert_eq!(c.power_down_hold_ms, c2.power_down_hold_ms);
        assert_eq!(c.debounce_settle_ms, c2.debounce_settle_ms);
    }

    #[test]
    fn hold_above_confirm_invariant() {
        let c = SystemConfig::default();
        assert!(
            c.power_down_hold_ms > c.power_on_confirm_ms,
            "power-down hold must be longer than power-on confirm, otherwise \
             a confirming hold would immediately power back down"
        );
    }

    #[test]
    fn inverted_thresholds_rejected() {
        let c = SystemConfig {
            power_on_confirm_ms: 2000,
            power_down_hold_ms: 500,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn sub_tick_debounce_rejected() {
        let c = SystemConfig {
            debounce_settle_ms: 5,
            control_loop_interval_ms: 10,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn postcard_roundtrip() {
        let c = SystemConfig::default();
        let bytes = postcard::to_allocvec(&c).unwrap();
        let c2: SystemConfig = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(c.power_down_hold_ms, c2.power_down_hold_ms);
        assert_eq!(c.telemetry_interval_secs, c2.telemetry_interval_secs);
    }
}
