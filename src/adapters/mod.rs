//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                          |
//! |------------|--------------|--------------------------------------|
//! | `hardware` | BoardPort    | Motor driver GPIO, flow ISR, soil I2C |
//! | `log_sink` | EventSink    | Serial log output                    |
//! | `nvs`      | SettingsPort | NVS / in-memory store                |
//! | `time`     | Clock        | ESP32 system timer                   |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
