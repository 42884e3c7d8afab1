//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DoorMonitor (domain)
//! ```
//!
//! Driven adapters (contact input, status LED, WiFi, MQTT client, NVS, log
//! sink) implement these traits.  The [`DoorMonitor`](super::service::DoorMonitor)
//! consumes them via generics, so the domain core never touches hardware
//! directly and every path runs on the host against mocks.

use core::fmt;

use crate::config::SystemConfig;
use crate::error::{ConnectError, PollError, PublishError, SensorError};
use crate::telemetry::inbound::InboundMessage;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this once per loop iteration.
pub trait SensorPort {
    /// Instantaneous contact level (`true` = asserted / high).
    fn read_contact(&mut self) -> Result<bool, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Indicator port (driven adapter: domain → status LED)
// ───────────────────────────────────────────────────────────────

/// Status indication.  Colour codes are `0xRRGGBB`.
pub trait IndicatorPort {
    fn set_indicator(&mut self, colour: u32);
}

/// Named indicator colours.
pub mod colour {
    /// Booting, nothing connected yet.
    pub const STARTING: u32 = 0x22_00_00;
    /// Access point joined, broker not yet connected.
    pub const NETWORK_UP: u32 = 0x00_00_22;
    /// Connected and monitoring.
    pub const NORMAL: u32 = 0x00_22_00;
    /// Answering a liveness query.
    pub const ALIVE: u32 = 0x00_00_22;
    /// Stopped after an orderly shutdown.
    pub const STOPPED: u32 = 0x22_22_00;
}

// ───────────────────────────────────────────────────────────────
// System port (clock, pacing, restart)
// ───────────────────────────────────────────────────────────────

pub trait SystemPort {
    /// Monotonic milliseconds since boot.
    fn uptime_ms(&self) -> u64;

    /// Block the calling task for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);

    /// Soft-reset the device.  Does not return on hardware; simulation
    /// backends record the request and return.
    fn restart(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Connectivity port (network link)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    AlreadyConnected,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::AlreadyConnected => write!(f, "already connected to AP"),
        }
    }
}

impl std::error::Error for ConnectivityError {}

pub trait ConnectivityPort {
    fn connect(&mut self) -> Result<(), ConnectivityError>;
    /// Safe to call when already disconnected.
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Publish/subscribe client (driven adapter: domain ↔ broker)
// ───────────────────────────────────────────────────────────────

/// Broker address and login.
#[derive(Debug, Clone, Copy)]
pub struct BrokerCredentials<'a> {
    pub host: &'a str,
    pub port: u16,
    pub username: &'a str,
    pub key: &'a str,
}

impl<'a> BrokerCredentials<'a> {
    pub fn from_config(cfg: &'a SystemConfig) -> Self {
        Self {
            host: cfg.broker_host.as_str(),
            port: cfg.broker_port,
            username: cfg.broker_username.as_str(),
            key: cfg.broker_key.as_str(),
        }
    }
}

/// The underlying MQTT client wrapped by
/// [`TelemetryPublisher`](crate::telemetry::TelemetryPublisher).
///
/// Every method makes a single attempt; retry policy belongs to the caller.
pub trait PubSubClient {
    /// Open a session and wait for the broker's acknowledgement.
    fn connect(&mut self, identity: &str, credentials: &BrokerCredentials<'_>) -> Result<(), ConnectError>;

    fn subscribe(&mut self, topic: &str) -> Result<(), ConnectError>;

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError>;

    /// Next queued inbound message, without blocking.
    fn poll(&mut self) -> Result<Option<InboundMessage>, PollError>;

    /// Release the session.  No-op when there is none.
    fn disconnect(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before persisting: invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`ConfigError::NotFound`] if nothing has been stored yet.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
