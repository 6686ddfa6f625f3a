//! One-shot hardware peripheral initialization.
//!
//! Configures GPIO directions and pulls using raw ESP-IDF sys calls.
//! Called once from `main()` before the event loop starts.  On host
//! targets the pin levels live in an in-memory register so drivers and
//! tests observe the same `gpio_read`/`gpio_write` surface.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::error::{Error, GpioError};
use crate::error::Result;
use crate::pins;

// ── Peripheral init ───────────────────────────────────────────

/// Configure the three latch-header pins:
/// button sense (input, pull-up), OFF line (output, driven low),
/// status LED (output, driven low).
#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<()> {
    // SAFETY: called once from main() before the event loop; single-threaded.
    unsafe {
        init_gpio_inputs()?;
        init_gpio_outputs()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<()> {
    // Simulated outputs start inactive; the button line idles high
    // (pulled up) until a test drives it.
    sim::set_level(pins::OFF_GPIO, false);
    sim::set_level(pins::STATUS_LED_GPIO, false);
    sim::set_level(pins::BUTTON_GPIO, true);
    log::info!("hw_init(sim): in-memory pin register initialised");
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<()> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::BUTTON_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK {
        return Err(Error::Gpio(GpioError::ConfigFailed(ret)));
    }
    info!("hw_init: button sense input configured (pull-up)");
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<()> {
    let cfg = gpio_config_t {
        pin_bit_mask: (1u64 << pins::OFF_GPIO) | (1u64 << pins::STATUS_LED_GPIO),
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK {
        return Err(Error::Gpio(GpioError::ConfigFailed(ret)));
    }

    // Both outputs inactive until the FSM says otherwise.  The OFF line
    // in particular must never glitch high during boot.
    unsafe {
        gpio_set_level(pins::OFF_GPIO as gpio_num_t, 0);
        gpio_set_level(pins::STATUS_LED_GPIO as gpio_num_t, 0);
    }
    info!("hw_init: OFF line and status LED outputs driven low");
    Ok(())
}

// ── Level access ──────────────────────────────────────────────

/// Read a pin level.  `true` = electrically high.
#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    unsafe { gpio_get_level(pin as gpio_num_t) != 0 }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: i32) -> bool {
    sim::get_level(pin)
}

/// Drive a pin level.  `true` = electrically high.
#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    unsafe {
        gpio_set_level(pin as gpio_num_t, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) {
    sim::set_level(pin, high);
}

// ── Park primitive ────────────────────────────────────────────

/// Hold the CPU after the OFF line has been asserted.  The latch is about
/// to cut our rail; there is nothing left to do but wait for it.
///
/// Never returns on hardware.  The unbounded loop lives here and only
/// here — the domain models power-down as a terminal FSM state instead.
#[cfg(target_os = "espidf")]
pub fn park() -> ! {
    info!("park: waiting for the latch to cut power");
    loop {
        unsafe {
            vTaskDelay(10);
        }
    }
}

/// Host-side park: log and return so simulations and tests can observe
/// the terminal state instead of hanging.
#[cfg(not(target_os = "espidf"))]
pub fn park() {
    log::info!("park(sim): would hold here until the rail drops");
}

// ── In-memory pin register (host targets) ─────────────────────

#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::sync::atomic::{AtomicU64, Ordering};

    /// One bit per GPIO number.  Lines idle high (pulled up).
    static LEVELS: AtomicU64 = AtomicU64::new(u64::MAX);

    pub fn set_level(pin: i32, high: bool) {
        let mask = 1u64 << pin;
        if high {
            LEVELS.fetch_or(mask, Ordering::SeqCst);
        } else {
            LEVELS.fetch_and(!mask, Ordering::SeqCst);
        }
    }

    pub fn get_level(pin: i32) -> bool {
        LEVELS.load(Ordering::SeqCst) & (1u64 << pin) != 0
    }
}

/// Test hook: drive a simulated input line (e.g. press the button by
/// pulling its sense line low).  Host targets only.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_level(pin: i32, high: bool) {
    sim::set_level(pin, high);
}
