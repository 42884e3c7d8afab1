//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements          | Connects to                 |
//! |-------------|---------------------|-----------------------------|
//! | `hardware`  | SensorPort          | reed-switch GPIO            |
//! |             | IndicatorPort       | RGB LED on LEDC PWM         |
//! | `log_sink`  | EventSink           | Serial log output           |
//! | `mqtt`      | PubSubClient        | ESP-IDF MQTT client         |
//! | `nvs`       | ConfigPort          | NVS / in-memory store       |
//! | `system`    | SystemPort          | ESP32 timer, FreeRTOS, reset|
//! | `wifi`      | ConnectivityPort    | ESP-IDF WiFi STA            |
//!
//! `device_id` derives the client identity from the factory MAC.

pub mod device_id;
pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod nvs;
pub mod system;
pub mod wifi;
