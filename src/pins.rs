//! GPIO pin assignments for the SoftLatch LP-1 controller header.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.
//!
//! Pin assignments match the J2 header pinout in the LP-1 hardware manual.

// ---------------------------------------------------------------------------
// Push-button sense (shared with the latch's SET input)
// ---------------------------------------------------------------------------

/// Button sense line.  The latch board exposes the momentary switch on its
/// SET net; the MCU reads it through a series resistor.  External pull-up,
/// LOW = pressed.
pub const BUTTON_GPIO: i32 = 3;

// ---------------------------------------------------------------------------
// Power-off request (latch RESET input)
// ---------------------------------------------------------------------------

/// OFF line to the latch flip-flop (active HIGH).  Driving this high makes
/// the latch cut the main rail — including this MCU's own supply.
pub const OFF_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Status indicator
// ---------------------------------------------------------------------------

/// Status LED (active HIGH).  Lit while the system considers itself "on".
pub const STATUS_LED_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// UART console
// ---------------------------------------------------------------------------

pub const UART_TX_GPIO: i32 = 21;
pub const UART_RX_GPIO: i32 = 20;
