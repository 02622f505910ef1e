//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements               | Connects to              |
//! |------------|--------------------------|--------------------------|
//! | `hardware` | EdgeInterrupts           | ESP32 GPIO ISR service   |
//! |            | embedded-hal pins, delay | ESP32 GPIO, FreeRTOS     |
//! | `log_sink` | DiagnosticsSink          | Serial log output        |
//! | `nvs`      | ConfigPort               | NVS / in-memory store    |
//! |            | StoragePort              |                          |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
