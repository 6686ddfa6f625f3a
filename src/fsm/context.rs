//! Shared mutable context threaded through every FSM handler.
//!
//! `MonitorContext` is the single struct that state handlers read from and
//! write to.  It contains the latest debounced input level, the press
//! timer, output commands, timing information, and configuration.  Think
//! of it as the "blackboard" in a blackboard architecture.

use crate::config::SystemConfig;

// ---------------------------------------------------------------------------
// Input snapshot (read-only to state handlers; written by the service)
// ---------------------------------------------------------------------------

/// Debounced logical level of the button sense line.
///
/// The line is active-low (external pull-up): electrically low reads as
/// `Pressed`.  The electrical mapping happens in the hardware adapter;
/// everything from the debouncer inward speaks in logical terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineState {
    Pressed,
    #[default]
    Released,
}

impl LineState {
    /// Map a raw electrical level (true = high) to the logical state.
    pub fn from_level(high: bool) -> Self {
        if high { Self::Released } else { Self::Pressed }
    }

    pub fn is_pressed(self) -> bool {
        self == Self::Pressed
    }
}

// ---------------------------------------------------------------------------
// Press timer
// ---------------------------------------------------------------------------

/// Hold-duration accumulator for the button.
///
/// Invariant: armed only while the debounced input reads `Pressed`; cleared
/// immediately on release or when a power action fires.  State handlers own
/// this discipline — the timer itself just stores the start timestamp.
#[derive(Debug, Clone, Copy, Default)]
pub struct PressTimer {
    start_ms: Option<u32>,
}

impl PressTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the press start.  A no-op if already armed, so handlers can
    /// call this every tick while the input stays asserted.
    pub fn arm(&mut self, now_ms: u32) {
        if self.start_ms.is_none() {
            self.start_ms = Some(now_ms);
        }
    }

    /// Reset to the unset sentinel.
    pub fn clear(&mut self) {
        self.start_ms = None;
    }

    pub fn is_armed(&self) -> bool {
        self.start_ms.is_some()
    }

    /// Hold duration so far, or `None` while unset.
    /// Wrapping subtraction tolerates `u32` millisecond rollover (~49 days).
    pub fn held_ms(&self, now_ms: u32) -> Option<u32> {
        self.start_ms.map(|s| now_ms.wrapping_sub(s))
    }
}

// ---------------------------------------------------------------------------
// Output commands (written by state handlers; consumed by the service)
// ---------------------------------------------------------------------------

/// Commands that state handlers write to request output actions.
/// The service applies these to the actual drivers each tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputCommands {
    /// Request the OFF line driven to its active level.  One-way: once
    /// set, no handler ever clears it (the rail is about to drop).
    pub off_asserted: bool,
    /// Status LED level: lit while the system considers itself "on".
    pub status_led_on: bool,
}

impl OutputCommands {
    /// Both outputs inactive — safe boot default.
    pub fn all_off() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Monitor actions
// ---------------------------------------------------------------------------

/// The outcome of one poll tick, as seen by the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    /// Nothing of note this tick.
    #[default]
    NoAction,
    /// Startup hold confirmed — the system is now running.
    ConfirmPowerOn,
    /// Power-down fires: either an accidental bump at startup or a
    /// sustained hold during normal operation.
    TriggerPowerDown,
    /// The button was released before reaching the hold threshold.
    ReleaseNoted,
}

// ---------------------------------------------------------------------------
// MonitorContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct MonitorContext {
    // -- Timing --
    /// Ticks elapsed since the current state was entered.
    pub ticks_in_state: u64,
    /// Monotonic total tick count.
    pub total_ticks: u64,
    /// Current monotonic time in milliseconds.  Written by the service
    /// before each FSM tick.
    pub now_ms: u32,

    // -- Input --
    /// Latest debounced button level.  Updated before each FSM tick.
    pub input: LineState,
    /// Hold-duration accumulator.
    pub press: PressTimer,

    // -- Outputs --
    /// Commands to be applied to the OFF line and LED after the FSM tick.
    pub commands: OutputCommands,

    // -- Configuration --
    /// System configuration (tunable thresholds).
    pub config: SystemConfig,

    // -- Result --
    /// Action produced by this tick's handler, taken by the service after
    /// every `tick()`.
    pub pending_action: Option<Action>,
}

impl MonitorContext {
    /// Create a new context with the given configuration.
    pub fn new(config: SystemConfig) -> Self {
        Self {
            ticks_in_state: 0,
            total_ticks: 0,
            now_ms: 0,
            input: LineState::Released,
            press: PressTimer::new(),
            commands: OutputCommands::all_off(),
            config,
            pending_action: None,
        }
    }

    /// Hold duration of the current press, or 0 while unset.
    pub fn held_ms(&self) -> u32 {
        self.press.held_ms(self.now_ms).unwrap_or(0)
    }
}
