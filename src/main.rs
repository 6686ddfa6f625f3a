//! SoftLatch Firmware — Main Entry Point
//!
//! Hexagonal architecture with a timer-driven polling loop.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  HardwareAdapter     LogEventSink    NvsAdapter              │
//! │  (Input+PowerRail)   (EventSink)     (ConfigPort)            │
//! │  ConsoleAdapter      MonotonicClock                          │
//! │  (override console)  (uptime)                                │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────────    │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │            PowerMonitor (pure logic)                   │  │
//! │  │  Debounce · PressTimer · FSM                           │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Module declarations ───────────────────────────────────────
pub mod config;
mod diagnostics;
mod error;
mod events;
mod pins;

pub mod app;
mod adapters;
mod drivers;
pub mod fsm;

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{info, warn};

use adapters::console::ConsoleAdapter;
use adapters::hardware::HardwareAdapter;
use adapters::log_sink::LogEventSink;
use adapters::nvs::NvsAdapter;
use adapters::time::MonotonicClock;
use app::commands::AppCommand;
use app::events::AppEvent;
use app::ports::{ConfigPort, EventSink};
use app::service::PowerMonitor;
use config::SystemConfig;
use drivers::off_line::OffLine;
use drivers::status_led::StatusLed;
use events::{Event, push_event};

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("SoftLatch v{} — soft power switch controller", env!("CARGO_PKG_VERSION"));

    // ── 2. Initialise hardware peripherals ────────────────────
    // Without the latch pins there is nothing we can safely do; bail
    // out and let the bootstrap reset us.
    drivers::hw_init::init_peripherals()
        .map_err(|e| anyhow::anyhow!("peripheral init: {e}"))?;

    // ── 3. Load config from NVS (or defaults) ─────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            // Continue without NVS — thresholds fall back to the
            // datasheet defaults this session.
            NvsAdapter::default()
        }
    };
    let config = match nvs.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };

    // ── 4. Construct adapters ─────────────────────────────────
    let clock = MonotonicClock::new();
    let mut hw = HardwareAdapter::new(OffLine::new(), StatusLed::new());
    let mut sink = LogEventSink::new();

    let mut console = match ConsoleAdapter::new() {
        Ok(c) => Some(c),
        Err(e) => {
            // The monitor runs fine without a console; overrides are
            // simply unavailable this session.
            warn!("console unavailable: {}", e);
            None
        }
    };

    // ── 5. Construct the monitor ──────────────────────────────
    let mut monitor = PowerMonitor::new(config.clone());
    monitor.start(&mut sink);

    // ── 6. Start the tick timer ───────────────────────────────
    drivers::hw_timer::start_timers(config.control_loop_interval_ms);

    info!("System ready. Entering event loop.");

    // ── 7. Event loop ─────────────────────────────────────────
    let ticks_per_telemetry = u64::from(config.telemetry_interval_secs) * 1000
        / u64::from(config.control_loop_interval_ms);
    let mut telemetry_counter: u64 = 0;

    loop {
        // Simulate the tick timer via sleep on non-espidf targets.
        // On real hardware, the CPU idles until the esp_timer callback
        // pushes the next ControlTick.
        #[cfg(not(target_os = "espidf"))]
        {
            std::thread::sleep(std::time::Duration::from_millis(u64::from(
                config.control_loop_interval_ms,
            )));
            push_event(Event::ControlTick);
        }

        // Process all pending events.
        events::drain_events(|event| match event {
            Event::ControlTick => {
                monitor.tick(&mut hw, &mut sink, clock.uptime_ms());

                telemetry_counter += 1;
                if telemetry_counter >= ticks_per_telemetry {
                    telemetry_counter = 0;
                    push_event(Event::TelemetryTick);
                }
            }

            Event::TelemetryTick => {
                let t = monitor.build_telemetry(clock.uptime_ms());
                sink.emit(&AppEvent::Telemetry(t));
            }
        });

        // Console override commands (polled, non-blocking).
        if let Some(console) = console.as_mut() {
            while let Some(cmd) = console.poll_command() {
                dispatch_command(cmd, &mut monitor, &mut hw, &mut sink, &nvs, &clock);
            }
        }

        // Terminal state: the OFF line is asserted, the latch is about
        // to cut our rail.  park() never returns on hardware; on host
        // targets it returns so simulations can exit cleanly.
        if monitor.is_terminal() {
            drivers::hw_init::park();
            #[cfg(not(target_os = "espidf"))]
            return Ok(());
        }
    }
}

// ── Console command dispatch ──────────────────────────────────
//
// Power commands go to the domain core; dump/save commands need the
// adapters and are handled here.

fn dispatch_command(
    cmd: AppCommand,
    monitor: &mut PowerMonitor,
    hw: &mut HardwareAdapter,
    sink: &mut LogEventSink,
    nvs: &NvsAdapter,
    clock: &MonotonicClock,
) {
    match cmd {
        AppCommand::ForcePowerDown | AppCommand::SimulateStuck => {
            monitor.handle_command(cmd, hw, sink);
        }

        AppCommand::ReportTelemetry => {
            let t = monitor.build_telemetry(clock.uptime_ms());
            match serde_json::to_string(&t) {
                Ok(json) => info!("telemetry: {json}"),
                Err(e) => warn!("telemetry encode failed: {e}"),
            }
        }

        AppCommand::DumpConfig => match serde_json::to_string(&monitor.current_config()) {
            Ok(json) => info!("config: {json}"),
            Err(e) => warn!("config encode failed: {e}"),
        },

        AppCommand::DumpDiagnostics => {
            let log = monitor.transitions();
            info!("transitions ({} recorded):", log.len());
            for r in log.iter() {
                info!("  {}ms {:?} -> {:?}", r.at_ms, r.from, r.to);
            }
        }

        AppCommand::SaveConfig => match nvs.save(&monitor.current_config()) {
            Ok(()) => info!("config persisted to NVS"),
            Err(e) => warn!("config save failed: {e}"),
        },
    }
}
