//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements         | Connects to              |
//! |-------------|--------------------|--------------------------|
//! | `hardware`  | SampleSource       | INA226 over I2C          |
//! |             | DumpLoadPort       | Dump-load GPIO           |
//! | `log_sink`  | EventSink          | Serial log output        |
//! | `nvs`       | StoragePort        | ESP-IDF NVS blob         |
//! | `region`    | StoragePort        | RAM (tests, simulation)  |
//! | `time`      | TimePort           | ESP32 system timer       |

pub mod hardware;
pub mod log_sink;
#[cfg(feature = "espidf")]
pub mod nvs;
pub mod region;
pub mod time;
