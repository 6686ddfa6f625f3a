//! Integration tests: PowerMonitor → FSM → power rail ports.

use softlatch::app::commands::AppCommand;
use softlatch::app::events::AppEvent;
use softlatch::app::ports::{EventSink, InputPort, PowerRailPort};
use softlatch::app::service::PowerMonitor;
use softlatch::config::SystemConfig;
use softlatch::fsm::StateId;
use softlatch::fsm::context::LineState;

// ── Mock implementations ──────────────────────────────────────

struct MockHw {
    level: LineState,
    off_asserts: u32,
    led_on: bool,
}

impl MockHw {
    fn new() -> Self {
        Self {
            level: LineState::Pressed, // the wake press is still held
            off_asserts: 0,
            led_on: false,
        }
    }
}

impl InputPort for MockHw {
    fn read_button(&mut self) -> LineState {
        self.level
    }
}

impl PowerRailPort for MockHw {
    fn assert_power_off(&mut self) {
        self.off_asserts += 1;
    }
    fn is_off_asserted(&self) -> bool {
        self.off_asserts > 0
    }
    fn set_status_led(&mut self, on: bool) {
        self.led_on = on;
    }
}

struct RecordingSink {
    events: Vec<String>,
}

impl RecordingSink {
    fn new() -> Self {
        Self { events: Vec::new() }
    }
    fn contains(&self, needle: &str) -> bool {
        self.events.iter().any(|e| e.contains(needle))
    }
    fn count(&self, needle: &str) -> usize {
        self.events.iter().filter(|e| e.contains(needle)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, e: &AppEvent) {
        self.events.push(format!("{:?}", e));
    }
}

// ── Harness ───────────────────────────────────────────────────

const TICK_MS: u32 = 10;

struct Harness {
    monitor: PowerMonitor,
    hw: MockHw,
    sink: RecordingSink,
    now_ms: u32,
}

impl Harness {
    fn new() -> Self {
        let mut monitor = PowerMonitor::new(SystemConfig::default());
        let mut sink = RecordingSink::new();
        monitor.start(&mut sink);
        Self {
            monitor,
            hw: MockHw::new(),
            sink,
            now_ms: 0,
        }
    }

    /// Hold the given raw level for `duration_ms`, ticking every TICK_MS.
    fn hold(&mut self, level: LineState, duration_ms: u32) {
        self.hw.level = level;
        let end = self.now_ms + duration_ms;
        while self.now_ms < end {
            self.monitor
                .tick(&mut self.hw, &mut self.sink, self.now_ms);
            self.now_ms += TICK_MS;
        }
    }

    /// Boot with the wake press held long enough to confirm, then release.
    fn boot_to_running(&mut self) {
        self.hold(LineState::Pressed, 600);
        assert_eq!(self.monitor.state(), StateId::Running);
        self.hold(LineState::Released, 100);
    }
}

// ── Startup confirmation ──────────────────────────────────────

#[test]
fn accidental_bump_powers_straight_back_down() {
    let mut h = Harness::new();

    // Held 200ms — well below the 500ms confirm threshold.
    h.hold(LineState::Pressed, 200);
    h.hold(LineState::Released, 100);

    assert!(h.monitor.is_terminal());
    assert_eq!(h.hw.off_asserts, 1, "OFF line must fire for a bump wake");
    assert!(!h.hw.led_on, "LED must never claim the system is on");
    assert!(h.sink.contains("TriggerPowerDown"));
    assert!(!h.sink.contains("ConfirmPowerOn"));
}

#[test]
fn confirmed_hold_reaches_running() {
    let mut h = Harness::new();

    h.hold(LineState::Pressed, 600);

    assert_eq!(h.monitor.state(), StateId::Running);
    assert!(h.hw.led_on, "status LED marks the system as on");
    assert_eq!(h.hw.off_asserts, 0);
    assert!(h.sink.contains("ConfirmPowerOn"));
}

// ── Normal operation ──────────────────────────────────────────

#[test]
fn short_press_in_running_takes_no_power_action() {
    let mut h = Harness::new();
    h.boot_to_running();

    h.hold(LineState::Pressed, 500);
    h.hold(LineState::Released, 100);

    assert_eq!(h.monitor.state(), StateId::Running);
    assert_eq!(h.hw.off_asserts, 0);
    // One ReleaseNoted from letting go of the boot press, one from this.
    assert_eq!(h.sink.count("ReleaseNoted"), 2);
}

#[test]
fn sustained_hold_in_running_powers_down() {
    let mut h = Harness::new();
    h.boot_to_running();

    h.hold(LineState::Pressed, 2200);

    assert!(h.monitor.is_terminal());
    assert_eq!(h.hw.off_asserts, 1);
    assert!(!h.hw.led_on, "LED must drop before the rail does");
}

// ── Debounce ──────────────────────────────────────────────────

#[test]
fn single_tick_glitch_does_not_abort_confirmation() {
    let mut h = Harness::new();

    h.hold(LineState::Pressed, 100);
    // One 10ms release glitch — shorter than the 20ms settle interval.
    h.hold(LineState::Released, 10);
    h.hold(LineState::Pressed, 500);

    assert_eq!(
        h.monitor.state(),
        StateId::Running,
        "a sub-settle flicker must not read as a release"
    );
    assert_eq!(h.hw.off_asserts, 0);
}

#[test]
fn single_tick_glitch_in_running_is_invisible() {
    let mut h = Harness::new();
    h.boot_to_running();
    let before = h.sink.events.len();

    h.hold(LineState::Pressed, 10);
    h.hold(LineState::Released, 200);

    assert_eq!(h.monitor.state(), StateId::Running);
    assert_eq!(
        h.sink.events.len(),
        before,
        "a sub-settle press must emit nothing at all"
    );
}

// ── Terminal idempotence ──────────────────────────────────────

#[test]
fn power_down_is_idempotent_under_further_polling() {
    let mut h = Harness::new();
    h.hold(LineState::Released, 100); // bump → PoweringDown
    assert!(h.monitor.is_terminal());

    let actions_before = h.sink.count("PowerAction");
    for _ in 0..50 {
        h.hold(LineState::Pressed, 20);
        h.hold(LineState::Released, 20);
    }

    assert_eq!(h.hw.off_asserts, 1, "OFF line written exactly once");
    assert_eq!(
        h.sink.count("PowerAction"),
        actions_before,
        "terminal state must emit no further actions"
    );
}

// ── Console overrides ─────────────────────────────────────────

#[test]
fn force_power_down_command_overrides_running() {
    let mut h = Harness::new();
    h.boot_to_running();

    h.monitor
        .handle_command(AppCommand::ForcePowerDown, &mut h.hw, &mut h.sink);

    assert!(h.monitor.is_terminal());
    assert_eq!(h.hw.off_asserts, 1);
}

#[test]
fn stuck_mode_freezes_the_monitor() {
    let mut h = Harness::new();
    h.boot_to_running();

    h.monitor
        .handle_command(AppCommand::SimulateStuck, &mut h.hw, &mut h.sink);
    assert!(h.sink.contains("StuckModeEngaged"));

    // A hold that would normally power down does nothing now.
    h.hold(LineState::Pressed, 3000);
    assert_eq!(h.monitor.state(), StateId::Running);
    assert_eq!(h.hw.off_asserts, 0);
}

// ── Transition log ────────────────────────────────────────────

#[test]
fn transition_log_records_the_boot_sequence() {
    let mut h = Harness::new();
    h.boot_to_running();

    let transitions: Vec<_> = h.monitor.transitions().iter().copied().collect();
    assert!(transitions.len() >= 2);
    assert_eq!(transitions[0].from, StateId::Booting);
    assert_eq!(transitions[0].to, StateId::ConfirmingPowerOn);
    assert_eq!(
        transitions.last().unwrap().to,
        StateId::Running,
        "log must end at Running after a confirmed boot"
    );
}

// ── End-to-end through the hardware adapter (simulated pins) ──
//
// One test only: the simulated pin register is process-global, so
// concurrent tests poking the same pins would race each other.

#[test]
fn simulated_pins_drive_the_full_stack() {
    use softlatch::adapters::console::ConsoleAdapter;
    use softlatch::adapters::hardware::HardwareAdapter;
    use softlatch::drivers::hw_init;
    use softlatch::drivers::off_line::OffLine;
    use softlatch::drivers::status_led::StatusLed;
    use softlatch::pins;

    hw_init::init_peripherals().unwrap();
    let mut hw = HardwareAdapter::new(OffLine::new(), StatusLed::new());
    let mut sink = RecordingSink::new();
    let mut monitor = PowerMonitor::new(SystemConfig::default());
    monitor.start(&mut sink);

    // Press (active low) through the confirm threshold.
    hw_init::sim_set_level(pins::BUTTON_GPIO, false);
    let mut now = 0;
    while now <= 600 {
        monitor.tick(&mut hw, &mut sink, now);
        now += TICK_MS;
    }
    assert_eq!(monitor.state(), StateId::Running);
    assert!(
        hw_init::gpio_read(pins::STATUS_LED_GPIO),
        "status LED pin must go high in Running"
    );
    assert!(!hw_init::gpio_read(pins::OFF_GPIO));

    // Release, then force power-down over the console.
    hw_init::sim_set_level(pins::BUTTON_GPIO, true);
    for _ in 0..10 {
        monitor.tick(&mut hw, &mut sink, now);
        now += TICK_MS;
    }

    let mut console = ConsoleAdapter::new().unwrap();
    console.inject(b'p');
    let cmd = console.poll_command().unwrap();
    monitor.handle_command(cmd, &mut hw, &mut sink);

    assert!(monitor.is_terminal());
    assert!(
        hw_init::gpio_read(pins::OFF_GPIO),
        "OFF pin must be electrically high after power-down"
    );
    assert!(!hw_init::gpio_read(pins::STATUS_LED_GPIO));
}
