//! Application service — the hexagonal core.
//!
//! [`PowerMonitor`] owns the FSM, the debouncer, and the shared context.
//! It exposes a clean, hardware-agnostic API.  All I/O flows through
//! port traits injected at call sites, making the entire service
//! testable with mock adapters.
//!
//! ```text
//!  InputPort ────▶ ┌────────────────────────┐ ──▶ EventSink
//!                  │      PowerMonitor       │
//!  PowerRailPort ◀─│  Debounce · FSM · Timer │
//!                  └────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::SystemConfig;
use crate::diagnostics::TransitionLog;
use crate::drivers::button::Debouncer;
use crate::fsm::context::{Action, LineState, MonitorContext};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};

use super::commands::AppCommand;
use super::events::{AppEvent, TelemetryData};
use super::ports::{EventSink, InputPort, PowerRailPort};

// ───────────────────────────────────────────────────────────────
// PowerMonitor
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct PowerMonitor {
    fsm: Fsm,
    ctx: MonitorContext,
    /// Settle-and-resample debouncer for the button line.
    debounce: Debouncer,
    /// Ring log of state transitions, dumped by the console `d` command.
    transitions: TransitionLog,
    tick_count: u64,
    /// Stuck-firmware test mode: once set, `tick()` does nothing and only
    /// the external latch's hardware override can power the board off.
    stuck: bool,
}

impl PowerMonitor {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM — call [`Self::start`] next.
    pub fn new(config: SystemConfig) -> Self {
        // The latch only woke us because the button is (or just was) held,
        // so the debouncer starts from Pressed.
        let debounce = Debouncer::new(config.debounce_settle_ms, LineState::Pressed);
        let ctx = MonitorContext::new(config);
        let fsm = Fsm::new(build_state_table(), StateId::Booting);

        Self {
            fsm,
            ctx,
            debounce,
            transitions: TransitionLog::new(),
            tick_count: 0,
            stuck: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the FSM in its initial state (Booting).
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("PowerMonitor started in {:?}", self.fsm.current_state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full poll cycle: sample → debounce → FSM → outputs.
    ///
    /// The `hw` parameter satisfies **both** [`InputPort`] and
    /// [`PowerRailPort`] — this avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut (impl InputPort + PowerRailPort),
        sink: &mut impl EventSink,
        now_ms: u32,
    ) {
        if self.stuck {
            return;
        }

        // 1. Sample and debounce the button line
        let raw = hw.read_button();
        let input = self.debounce.sample(now_ms, raw);

        // 2. FSM tick (pure state logic)
        let prev_state = self.fsm.current_state();
        let action = self.poll_once(now_ms, input);

        // 3. Apply output commands via PowerRailPort
        self.apply_outputs(hw);

        // 4. Emit state change / action events
        let new_state = self.fsm.current_state();
        if new_state != prev_state {
            self.transitions.record(now_ms, prev_state, new_state);
            sink.emit(&AppEvent::StateChanged {
                from: prev_state,
                to: new_state,
            });
        }
        if action != Action::NoAction {
            sink.emit(&AppEvent::PowerAction(action));
        }
    }

    /// Advance the monitor by one tick, given the current monotonic time
    /// and the **debounced** input level.
    ///
    /// This is the contract the whole component reduces to: a function of
    /// current state and input, returning what (if anything) happened.
    /// [`Self::tick`] wraps it with port I/O; tests drive it directly.
    pub fn poll_once(&mut self, now_ms: u32, input: LineState) -> Action {
        self.tick_count += 1;
        self.ctx.now_ms = now_ms;
        self.ctx.input = input;
        self.fsm.tick(&mut self.ctx);
        self.ctx.pending_action.take().unwrap_or_default()
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an override command from the serial console.
    ///
    /// The dump/save commands need adapter access and are handled by the
    /// main loop instead; they fall through here untouched.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl PowerRailPort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::ForcePowerDown => {
                if self.fsm.current_state() != StateId::PoweringDown {
                    let prev = self.fsm.current_state();
                    warn!("console override: forcing power-down");
                    self.fsm
                        .force_transition(StateId::PoweringDown, &mut self.ctx);
                    self.apply_outputs(hw);
                    self.transitions
                        .record(self.ctx.now_ms, prev, StateId::PoweringDown);
                    sink.emit(&AppEvent::StateChanged {
                        from: prev,
                        to: StateId::PoweringDown,
                    });
                }
            }
            AppCommand::SimulateStuck => {
                if !self.stuck {
                    self.stuck = true;
                    warn!(
                        "console override: stuck test engaged — polling halted, \
                         hardware long-press is now the only way off"
                    );
                    sink.emit(&AppEvent::StuckModeEngaged);
                }
            }
            AppCommand::ReportTelemetry
            | AppCommand::DumpConfig
            | AppCommand::DumpDiagnostics
            | AppCommand::SaveConfig => {
                // Handled by the main loop, which owns the adapters.
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the current context.
    pub fn build_telemetry(&self, uptime_ms: u32) -> TelemetryData {
        TelemetryData {
            state: self.fsm.current_state(),
            uptime_ms,
            button_pressed: self.ctx.input.is_pressed(),
            held_ms: self.ctx.held_ms(),
            off_asserted: self.ctx.commands.off_asserted,
            total_ticks: self.tick_count,
        }
    }

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// True once the monitor has entered its terminal state.
    pub fn is_terminal(&self) -> bool {
        self.fsm.current_state() == StateId::PoweringDown
    }

    /// True while the stuck-firmware test mode is engaged.
    pub fn is_stuck(&self) -> bool {
        self.stuck
    }

    /// Total poll ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Clone of the live configuration (for the console dump).
    pub fn current_config(&self) -> SystemConfig {
        self.ctx.config.clone()
    }

    /// The state-transition ring log.
    pub fn transitions(&self) -> &TransitionLog {
        &self.transitions
    }

    // ── Internal ──────────────────────────────────────────────

    /// Translate FSM output commands into port calls.
    fn apply_outputs(&self, hw: &mut impl PowerRailPort) {
        let cmds = &self.ctx.commands;
        hw.set_status_led(cmds.status_led_on);
        if cmds.off_asserted && !hw.is_off_asserted() {
            hw.assert_power_off();
        }
    }
}
