//! Concrete state handler functions and table builder.
//!
//! Each state is defined by three plain `fn` pointers — no closures, no
//! dynamic dispatch, no heap.  This is the classic embedded C FSM pattern
//! expressed in safe Rust.
//!
//! ```text
//!  BOOTING ──[first tick]──▶ CONFIRMING_POWER_ON
//!                                │           │
//!                     [held >= confirm]   [released early]
//!                                ▼           │
//!                             RUNNING        │
//!                                │           │
//!                      [held >= hold]        │
//!                                ▼           ▼
//!                             POWERING_DOWN (terminal)
//! ```
//!
//! Both power-down edges report `TriggerPowerDown`; a release below the
//! hold threshold in RUNNING reports `ReleaseNoted` and nothing else.

use super::context::{Action, MonitorContext};
use super::{StateDescriptor, StateId};
use log::info;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0 — Booting
        StateDescriptor {
            id: StateId::Booting,
            name: "Booting",
            on_enter: Some(booting_enter),
            on_exit: None,
            on_update: booting_update,
        },
        // Index 1 — ConfirmingPowerOn
        StateDescriptor {
            id: StateId::ConfirmingPowerOn,
            name: "ConfirmingPowerOn",
            on_enter: Some(confirming_enter),
            on_exit: None,
            on_update: confirming_update,
        },
        // Index 2 — Running
        StateDescriptor {
            id: StateId::Running,
            name: "Running",
            on_enter: Some(running_enter),
            on_exit: None,
            on_update: running_update,
        },
        // Index 3 — PoweringDown
        StateDescriptor {
            id: StateId::PoweringDown,
            name: "PoweringDown",
            on_enter: Some(powering_down_enter),
            on_exit: None,
            on_update: powering_down_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  BOOTING state
// ═══════════════════════════════════════════════════════════════════════════

fn booting_enter(ctx: &mut MonitorContext) {
    // Outputs inactive until the wake is confirmed.
    ctx.commands = super::context::OutputCommands::all_off();
    ctx.press.clear();
    info!("BOOTING: latch woke us, outputs safe");
}

fn booting_update(_ctx: &mut MonitorContext) -> Option<StateId> {
    // Nothing to wait for — begin timing the wake press immediately.
    Some(StateId::ConfirmingPowerOn)
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONFIRMING_POWER_ON state — was the wake press intentional?
// ═══════════════════════════════════════════════════════════════════════════

fn confirming_enter(ctx: &mut MonitorContext) {
    info!(
        "CONFIRMING: hold for {}ms to stay on",
        ctx.config.power_on_confirm_ms
    );
}

fn confirming_update(ctx: &mut MonitorContext) -> Option<StateId> {
    if !ctx.input.is_pressed() {
        // Released before the confirm threshold: the wake was a bump
        // against the button.  Power straight back down.
        ctx.pending_action = Some(Action::TriggerPowerDown);
        info!("CONFIRMING: released early, treating wake as accidental");
        return Some(StateId::PoweringDown);
    }

    ctx.press.arm(ctx.now_ms);
    let held = ctx.held_ms();
    if held >= ctx.config.power_on_confirm_ms {
        ctx.pending_action = Some(Action::ConfirmPowerOn);
        info!("CONFIRMING: hold confirmed after {held}ms");
        return Some(StateId::Running);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  RUNNING state — normal operation, watching for a power-down hold
// ═══════════════════════════════════════════════════════════════════════════

fn running_enter(ctx: &mut MonitorContext) {
    ctx.commands.status_led_on = true;
    ctx.press.clear();
    info!(
        "RUNNING: system on, hold {}ms to power down",
        ctx.config.power_down_hold_ms
    );
}

fn running_update(ctx: &mut MonitorContext) -> Option<StateId> {
    if ctx.input.is_pressed() {
        ctx.press.arm(ctx.now_ms);
        if ctx.held_ms() >= ctx.config.power_down_hold_ms {
            ctx.pending_action = Some(Action::TriggerPowerDown);
            info!("RUNNING: power-down hold detected");
            return Some(StateId::PoweringDown);
        }
    } else if ctx.press.is_armed() {
        // Released below threshold — note it and reset the timer.
        ctx.press.clear();
        ctx.pending_action = Some(Action::ReleaseNoted);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  POWERING_DOWN state — terminal; the latch is about to cut our rail
// ═══════════════════════════════════════════════════════════════════════════

fn powering_down_enter(ctx: &mut MonitorContext) {
    // The power action consumes the press timer; this also covers the
    // console-forced entry path.
    ctx.press.clear();
    ctx.commands.status_led_on = false;
    ctx.commands.off_asserted = true;
    info!("POWERING_DOWN: OFF line asserted, awaiting rail cut");
}

fn powering_down_update(_ctx: &mut MonitorContext) -> Option<StateId> {
    // Terminal.  The external hardware removes power; until it does,
    // every further tick is a no-op.
    None
}
