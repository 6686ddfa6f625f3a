//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern ported to Rust:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StateTable                                                  │
//! │  ┌────────────────────┬──────────┬─────────┬───────────────┐ │
//! │  │ StateId            │ on_enter │ on_exit │ on_update     │ │
//! │  ├────────────────────┼──────────┼─────────┼───────────────┤ │
//! │  │ Booting            │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Opt  │ │
//! │  │ ConfirmingPowerOn  │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Opt  │ │
//! │  │ Running            │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Opt  │ │
//! │  │ PoweringDown       │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Opt  │ │
//! │  └────────────────────┴──────────┴─────────┴───────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next_id)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and updates the
//! current pointer.  All functions receive `&mut MonitorContext` which
//! holds the debounced input, press timer, output commands, config,
//! and timing.

pub mod context;
pub mod states;

use context::MonitorContext;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all possible system states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
/// Serializes as the state name (telemetry JSON).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[repr(u8)]
pub enum StateId {
    Booting = 0,
    ConfirmingPowerOn = 1,
    Running = 2,
    PoweringDown = 3,
}

impl StateId {
    /// Total number of states — used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert a `u8` index back to `StateId`.  Panics on out-of-range in
    /// debug builds; returns `Running` in release — the fail-safe for a
    /// power controller is to keep the rail up, never to cut it spuriously.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Booting,
            1 => Self::ConfirmingPowerOn,
            2 => Self::Running,
            3 => Self::PoweringDown,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Running
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut MonitorContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut MonitorContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array — no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the state table (array of [`StateDescriptor`]) and is driven with
/// a mutable [`MonitorContext`] threaded through every handler call.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Monotonically increasing tick counter (wraps at u64::MAX).
    tick_count: u64,
    /// Tick at which the current state was entered.
    state_entry_tick: u64,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut MonitorContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.
    ///
    /// 1. Call `on_update` for the current state.
    /// 2. If it returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    /// 3. Increment tick counter.
    pub fn tick(&mut self, ctx: &mut MonitorContext) {
        self.tick_count += 1;
        ctx.ticks_in_state = self.tick_count - self.state_entry_tick;
        ctx.total_ticks = self.tick_count;

        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Force an immediate transition (used by the console override path to
    /// jump to `PoweringDown` regardless of what `on_update` returned).
    pub fn force_transition(&mut self, next: StateId, ctx: &mut MonitorContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    /// How many ticks the FSM has been in the current state.
    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut MonitorContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        // Exit current state
        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        // Update pointer and timing
        self.current = next_idx;
        self.state_entry_tick = self.tick_count;
        ctx.ticks_in_state = 0;

        // Enter new state
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::context::{Action, LineState, MonitorContext};
    use super::*;
    use crate::config::SystemConfig;

    fn make_ctx() -> MonitorContext {
        MonitorContext::new(SystemConfig::default())
    }

    fn make_fsm() -> Fsm {
        Fsm::new(states::build_state_table(), StateId::Booting)
    }

    /// Drive one tick with the given time and input level.
    fn step(fsm: &mut Fsm, ctx: &mut MonitorContext, now_ms: u32, input: LineState) -> Action {
        ctx.now_ms = now_ms;
        ctx.input = input;
        fsm.tick(ctx);
        ctx.pending_action.take().unwrap_or(Action::NoAction)
    }

    #[test]
    fn starts_in_booting() {
        let fsm = make_fsm();
        assert_eq!(fsm.current_state(), StateId::Booting);
    }

    #[test]
    fn start_runs_on_enter_with_safe_outputs() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        ctx.commands.status_led_on = true; // must be wiped by booting_enter
        fsm.start(&mut ctx);
        assert!(!ctx.commands.off_asserted);
        assert!(!ctx.commands.status_led_on);
    }

    #[test]
    fn booting_advances_to_confirming_on_first_tick() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        step(&mut fsm, &mut ctx, 0, LineState::Pressed);
        assert_eq!(fsm.current_state(), StateId::ConfirmingPowerOn);
    }

    #[test]
    fn early_release_during_confirm_powers_down() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        step(&mut fsm, &mut ctx, 0, LineState::Pressed); // -> Confirming
        step(&mut fsm, &mut ctx, 10, LineState::Pressed);
        let action = step(&mut fsm, &mut ctx, 200, LineState::Released);
        assert_eq!(action, Action::TriggerPowerDown);
        assert_eq!(fsm.current_state(), StateId::PoweringDown);
        assert!(ctx.commands.off_asserted);
        assert!(!ctx.commands.status_led_on);
    }

    #[test]
    fn sustained_hold_confirms_power_on() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        step(&mut fsm, &mut ctx, 0, LineState::Pressed); // -> Confirming
        let mut confirmed = false;
        for t in (10..=600).step_by(10) {
            if step(&mut fsm, &mut ctx, t, LineState::Pressed) == Action::ConfirmPowerOn {
                confirmed = true;
                break;
            }
        }
        assert!(confirmed, "hold past 500ms must confirm power-on");
        assert_eq!(fsm.current_state(), StateId::Running);
        assert!(ctx.commands.status_led_on);
        assert!(!ctx.press.is_armed(), "timer must reset on confirm");
    }

    #[test]
    fn exact_threshold_hold_confirms() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        step(&mut fsm, &mut ctx, 0, LineState::Pressed); // -> Confirming
        step(&mut fsm, &mut ctx, 10, LineState::Pressed); // timer armed at t=10
        // d >= 500 is inclusive.
        let action = step(&mut fsm, &mut ctx, 510, LineState::Pressed);
        assert_eq!(action, Action::ConfirmPowerOn);
    }

    fn run_to_running(fsm: &mut Fsm, ctx: &mut MonitorContext) -> u32 {
        fsm.start(ctx);
        step(fsm, ctx, 0, LineState::Pressed);
        let mut t = 0;
        while fsm.current_state() != StateId::Running {
            t += 10;
            step(fsm, ctx, t, LineState::Pressed);
            assert!(t < 1000, "confirm must happen well before 1s");
        }
        // Release the boot press.
        t += 10;
        step(fsm, ctx, t, LineState::Released);
        t
    }

    #[test]
    fn short_press_in_running_is_release_noted() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        let t0 = run_to_running(&mut fsm, &mut ctx);

        step(&mut fsm, &mut ctx, t0 + 100, LineState::Pressed);
        step(&mut fsm, &mut ctx, t0 + 400, LineState::Pressed);
        let action = step(&mut fsm, &mut ctx, t0 + 500, LineState::Released);
        assert_eq!(action, Action::ReleaseNoted);
        assert_eq!(fsm.current_state(), StateId::Running);
        assert!(!ctx.press.is_armed(), "timer must reset on release");
        assert!(!ctx.commands.off_asserted);
    }

    #[test]
    fn long_hold_in_running_powers_down() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        let t0 = run_to_running(&mut fsm, &mut ctx);

        let mut action = Action::NoAction;
        for dt in (10..=2100).step_by(10) {
            action = step(&mut fsm, &mut ctx, t0 + dt, LineState::Pressed);
            if action != Action::NoAction {
                break;
            }
        }
        assert_eq!(action, Action::TriggerPowerDown);
        assert_eq!(fsm.current_state(), StateId::PoweringDown);
        assert!(ctx.commands.off_asserted);
        assert!(!ctx.commands.status_led_on);
    }

    #[test]
    fn powering_down_is_terminal_and_silent() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        step(&mut fsm, &mut ctx, 0, LineState::Pressed);
        step(&mut fsm, &mut ctx, 10, LineState::Released); // bump -> PoweringDown
        assert_eq!(fsm.current_state(), StateId::PoweringDown);

        for (i, input) in [LineState::Pressed, LineState::Released]
            .into_iter()
            .cycle()
            .take(50)
            .enumerate()
        {
            let action = step(&mut fsm, &mut ctx, 100 + i as u32 * 10, input);
            assert_eq!(action, Action::NoAction, "terminal state must stay silent");
            assert_eq!(fsm.current_state(), StateId::PoweringDown);
            assert!(ctx.commands.off_asserted);
        }
    }

    #[test]
    fn force_transition_runs_enter_handler() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        fsm.force_transition(StateId::PoweringDown, &mut ctx);
        assert_eq!(fsm.current_state(), StateId::PoweringDown);
        assert!(ctx.commands.off_asserted);
    }

    #[test]
    fn tick_increments_counter() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        step(&mut fsm, &mut ctx, 0, LineState::Pressed); // transition resets count
        step(&mut fsm, &mut ctx, 10, LineState::Pressed);
        assert_eq!(fsm.ticks_in_current_state(), 1);
        step(&mut fsm, &mut ctx, 20, LineState::Pressed);
        assert_eq!(fsm.ticks_in_current_state(), 2);
    }

    #[test]
    fn state_id_from_index_roundtrip() {
        for i in 0..StateId::COUNT {
            let id = StateId::from_index(i);
            assert_eq!(id as usize, i);
        }
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn state_id_from_invalid_index_keeps_rail_up() {
        let id = StateId::from_index(99);
        assert_eq!(id, StateId::Running);
    }
}
