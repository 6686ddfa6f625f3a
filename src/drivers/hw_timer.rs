//! Hardware timer module using ESP-IDF's esp_timer API.
//!
//! Creates the periodic control-tick timer that pushes events into the
//! lock-free SPSC queue.  On simulation targets the main loop sleeps and
//! pushes the tick itself, so nothing is started here.
//!
//! Timer callbacks execute in the ESP timer task context (not ISR), so
//! they can safely call push_event() which uses AtomicU8.

#[cfg(target_os = "espidf")]
use crate::events::{Event, push_event};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
static mut CONTROL_TIMER: esp_timer_handle_t = core::ptr::null_mut();

#[cfg(target_os = "espidf")]
unsafe extern "C" fn control_tick_cb(_arg: *mut core::ffi::c_void) {
    push_event(Event::ControlTick);
}

/// Start the control tick timer at the configured poll period.
#[cfg(target_os = "espidf")]
pub fn start_timers(control_period_ms: u32) {
    // SAFETY: CONTROL_TIMER is written here once at boot from the single
    // main-task context before any timer callbacks fire.  The callback
    // itself only calls push_event(), which is ISR-safe.
    unsafe {
        let args = esp_timer_create_args_t {
            callback: Some(control_tick_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: c"ctrl_tick".as_ptr(),
            skip_unhandled_events: true,
        };
        esp_timer_create(&args, &raw mut CONTROL_TIMER);
        esp_timer_start_periodic(CONTROL_TIMER, u64::from(control_period_ms) * 1000);
    }
    info!("hw_timer: control tick started ({control_period_ms}ms period)");
}

/// Simulation targets tick from the main loop instead.
#[cfg(not(target_os = "espidf"))]
pub fn start_timers(_control_period_ms: u32) {
    log::info!("hw_timer(sim): main loop drives the tick");
}
