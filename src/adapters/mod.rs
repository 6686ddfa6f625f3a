//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements    | Connects to                |
//! |------------|---------------|----------------------------|
//! | `hardware` | InputPort     | button sense GPIO          |
//! |            | PowerRailPort | OFF line + status LED GPIO |
//! | `log_sink` | EventSink     | Serial log output          |
//! | `nvs`      | ConfigPort    | NVS / in-memory store      |
//! | `time`     | —             | ESP32 system timer         |
//! | `console`  | —             | UART0 override console     |

pub mod console;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
