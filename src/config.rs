//! System configuration parameters
//!
//! Every tunable of the door monitor: network and broker credentials,
//! topic names, and loop timing.  Values are persisted in NVS and seeded on
//! first boot from build-time environment variables, so nothing
//! site-specific lives in the source.

use core::fmt::Write as _;

use serde::{Deserialize, Serialize};

use log::{error, info, warn};

use crate::app::ports::{ConfigError, ConfigPort};

pub type Ssid = heapless::String<32>;
pub type Secret = heapless::String<64>;
pub type Host = heapless::String<64>;
pub type Topic = heapless::String<64>;
pub type Label = heapless::String<32>;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Network ---
    /// WiFi access point name
    pub wifi_ssid: Ssid,
    /// WPA2 passphrase (empty for an open network)
    pub wifi_password: Secret,
    /// Upper bound on a single access point join, and separately on the
    /// broker handshake (milliseconds)
    pub wifi_connect_timeout_ms: u32,

    // --- Broker ---
    pub broker_host: Host,
    pub broker_port: u16,
    pub broker_username: Label,
    /// Broker password / API key
    pub broker_key: Secret,
    /// MQTT client identifier; empty means "derive from the factory MAC"
    pub client_id: Label,
    /// Human-readable name used in connect/disconnect notices
    pub device_name: Label,

    // --- Topics ---
    /// Outbound feed for door state and notices
    pub status_topic: Topic,
    /// Inbound feed: payload "1" reboots the device
    pub reset_topic: Topic,
    /// Inbound feed: payload "1" requests a liveness report
    pub status_command_topic: Topic,

    // --- Timing ---
    /// Minimum dwell before a contact level counts as stable (milliseconds)
    pub debounce_window_ms: u32,
    /// Main loop pacing delay (milliseconds)
    pub poll_interval_ms: u32,
    /// Delay between the reboot notice and the restart (milliseconds)
    pub reboot_grace_ms: u32,
    /// Pause between the ALIVE indicator and the liveness publish (milliseconds)
    pub status_pause_ms: u32,
    /// Cap for the broker reconnect backoff (seconds)
    pub reconnect_max_backoff_secs: u32,
    /// Task watchdog timeout (milliseconds)
    pub watchdog_timeout_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Network
            wifi_ssid: Ssid::new(),
            wifi_password: Secret::new(),
            wifi_connect_timeout_ms: 5_000,

            // Broker
            broker_host: bounded("io.adafruit.com"),
            broker_port: 1883,
            broker_username: Label::new(),
            broker_key: Secret::new(),
            client_id: Label::new(),
            device_name: bounded("Door sensor"),

            // Topics
            status_topic: bounded("doorwatch/feeds/system-status"),
            reset_topic: bounded("doorwatch/feeds/reset-button"),
            status_command_topic: bounded("doorwatch/feeds/status-button"),

            // Timing
            debounce_window_ms: 100,
            poll_interval_ms: 100,
            reboot_grace_ms: 2_000,
            status_pause_ms: 2_000,
            reconnect_max_backoff_secs: 60,
            watchdog_timeout_ms: 20_000,
        }
    }
}

/// Copy `s` into a bounded string, truncating at a char boundary.
fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Build-time provisioning values, captured by `option_env!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOverrides {
    pub wifi_ssid: Option<&'static str>,
    pub wifi_password: Option<&'static str>,
    pub broker_host: Option<&'static str>,
    pub broker_port: Option<&'static str>,
    pub broker_username: Option<&'static str>,
    pub broker_key: Option<&'static str>,
    pub client_id: Option<&'static str>,
    /// Replaces the `doorwatch` prefix of all three topics.
    pub topic_prefix: Option<&'static str>,
}

impl BuildOverrides {
    /// Values baked in from `DOORWATCH_*` variables at compile time.
    pub const fn from_env() -> Self {
        Self {
            wifi_ssid: option_env!("DOORWATCH_WIFI_SSID"),
            wifi_password: option_env!("DOORWATCH_WIFI_PASSWORD"),
            broker_host: option_env!("DOORWATCH_BROKER_HOST"),
            broker_port: option_env!("DOORWATCH_BROKER_PORT"),
            broker_username: option_env!("DOORWATCH_BROKER_USER"),
            broker_key: option_env!("DOORWATCH_BROKER_KEY"),
            client_id: option_env!("DOORWATCH_CLIENT_ID"),
            topic_prefix: option_env!("DOORWATCH_TOPIC_PREFIX"),
        }
    }
}

impl SystemConfig {
    /// Overlay build-time provisioning values.  Used on first boot only;
    /// once a config is stored in NVS it wins.
    pub fn with_build_overrides(mut self, env: &BuildOverrides) -> Result<Self, ConfigError> {
        if let Some(v) = env.wifi_ssid {
            self.wifi_ssid = exact(v, "DOORWATCH_WIFI_SSID too long")?;
        }
        if let Some(v) = env.wifi_password {
            self.wifi_password = exact(v, "DOORWATCH_WIFI_PASSWORD too long")?;
        }
        if let Some(v) = env.broker_host {
            self.broker_host = exact(v, "DOORWATCH_BROKER_HOST too long")?;
        }
        if let Some(v) = env.broker_port {
            self.broker_port = v
                .parse()
                .map_err(|_| ConfigError::ValidationFailed("DOORWATCH_BROKER_PORT is not a port"))?;
        }
        if let Some(v) = env.broker_username {
            self.broker_username = exact(v, "DOORWATCH_BROKER_USER too long")?;
        }
        if let Some(v) = env.broker_key {
            self.broker_key = exact(v, "DOORWATCH_BROKER_KEY too long")?;
        }
        if let Some(v) = env.client_id {
            self.client_id = exact(v, "DOORWATCH_CLIENT_ID too long")?;
        }
        if let Some(prefix) = env.topic_prefix {
            self.status_topic = prefixed(prefix, "system-status")?;
            self.reset_topic = prefixed(prefix, "reset-button")?;
            self.status_command_topic = prefixed(prefix, "status-button")?;
        }
        Ok(self)
    }

    /// Whether network credentials have been provisioned.
    pub fn is_provisioned(&self) -> bool {
        !self.wifi_ssid.is_empty()
    }

    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce_window_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "debounce_window_ms must be > 0",
            ));
        }
        if !(10..=10_000).contains(&self.poll_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "poll_interval_ms must be 10–10000",
            ));
        }
        if self.reboot_grace_ms > 60_000 {
            return Err(ConfigError::ValidationFailed(
                "reboot_grace_ms must be ≤ 60000",
            ));
        }
        if self.status_pause_ms > 10_000 {
            return Err(ConfigError::ValidationFailed(
                "status_pause_ms must be ≤ 10000",
            ));
        }
        if !(2..=3600).contains(&self.reconnect_max_backoff_secs) {
            return Err(ConfigError::ValidationFailed(
                "reconnect_max_backoff_secs must be 2–3600",
            ));
        }
        if self.broker_host.is_empty() {
            return Err(ConfigError::ValidationFailed("broker_host must be set"));
        }
        if self.broker_port == 0 {
            return Err(ConfigError::ValidationFailed("broker_port must be non-zero"));
        }
        let topics = [
            &self.status_topic,
            &self.reset_topic,
            &self.status_command_topic,
        ];
        if topics.iter().any(|t| t.is_empty()) {
            return Err(ConfigError::ValidationFailed("topics must be non-empty"));
        }
        if self.status_topic == self.reset_topic
            || self.status_topic == self.status_command_topic
            || self.reset_topic == self.status_command_topic
        {
            return Err(ConfigError::ValidationFailed("topics must be distinct"));
        }
        // A reconnect waits for the AP join and then the broker handshake.
        let reconnect_block = self.wifi_connect_timeout_ms.saturating_mul(2);
        let longest_block = self
            .reboot_grace_ms
            .max(self.status_pause_ms)
            .max(reconnect_block)
            .saturating_add(self.poll_interval_ms);
        if self.watchdog_timeout_ms <= longest_block {
            return Err(ConfigError::ValidationFailed(
                "watchdog_timeout_ms must exceed the longest blocking wait",
            ));
        }
        Ok(())
    }
}

/// Boot-time config resolution: the stored config if it is usable,
/// otherwise defaults overlaid with `env`, validated and persisted.
///
/// Never fails; a config that cannot be stored is still used for this
/// session, and rejected build-time values fall back to plain defaults.
pub fn load_or_seed(store: &impl ConfigPort, env: &BuildOverrides) -> SystemConfig {
    match store.load() {
        Ok(cfg) => return cfg,
        Err(ConfigError::NotFound) => info!("Config: first boot, seeding from build values"),
        Err(e) => warn!("Config: stored config unusable ({}), reseeding", e),
    }

    let seeded = SystemConfig::default()
        .with_build_overrides(env)
        .and_then(|cfg| cfg.validate().map(|()| cfg));
    match seeded {
        Ok(cfg) => {
            if let Err(e) = store.save(&cfg) {
                warn!("Config: not persisted ({}), using it for this session", e);
            }
            cfg
        }
        Err(e) => {
            error!("Config: build values rejected ({}), using defaults", e);
            SystemConfig::default()
        }
    }
}

fn exact<const N: usize>(v: &str, err: &'static str) -> Result<heapless::String<N>, ConfigError> {
    heapless::String::try_from(v).map_err(|_| ConfigError::ValidationFailed(err))
}

fn prefixed(prefix: &str, feed: &str) -> Result<Topic, ConfigError> {
    let mut t = Topic::new();
    write!(t, "{}/feeds/{}", prefix, feed)
        .map_err(|_| ConfigError::ValidationFailed("DOORWATCH_TOPIC_PREFIX too long"))?;
    Ok(t)
}
