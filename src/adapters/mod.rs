//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements            | Connects to                 |
//! |--------------|-----------------------|-----------------------------|
//! | `file_store` | ConfigStore           | Config file on SPIFFS / RAM |
//! | `lcd`        | DisplayPort           | HD44780 over PCF8574 I2C    |
//! | `log_sink`   | EventSink             | Serial log output           |
//! | `tcp_server` | Listener, Transport   | lwIP / std TCP sockets      |
//! | `time`       | DelayNs               | FreeRTOS tick / thread sleep|
//! | `wifi`       | (none)                | ESP-IDF WiFi STA            |
//! | `ws2812`     | PixelSink             | ESP32 RMT peripheral        |

pub mod file_store;
pub mod lcd;
pub mod log_sink;
pub mod tcp_server;
pub mod time;
pub mod wifi;
#[cfg(target_os = "espidf")]
pub mod ws2812;
