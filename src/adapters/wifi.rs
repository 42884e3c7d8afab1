//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`], the hexagonal boundary for network
//! connectivity.  Reconnection policy lives in the
//! [`DoorMonitor`](crate::app::service::DoorMonitor); this adapter makes
//! exactly one bounded join attempt per `connect()`.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `BlockingWifi<EspWifi>` from `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{ConnectivityError, ConnectivityPort};
use crate::config::{Secret, Ssid};

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    ssid: Ssid,
    password: Secret,
    timeout_ms: u32,
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim_link_up: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_attempts: u32,
}

impl WifiAdapter {
    /// `timeout_ms` bounds a single join attempt.
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: BlockingWifi<EspWifi<'static>>, timeout_ms: u32) -> Self {
        Self {
            ssid: Ssid::new(),
            password: Secret::new(),
            timeout_ms,
            wifi,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            ssid: Ssid::new(),
            password: Secret::new(),
            timeout_ms,
            sim_link_up: false,
            sim_attempts: 0,
        }
    }

    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid = Ssid::try_from(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        self.password = Secret::try_from(password).map_err(|_| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials set (SSID='{}')", self.ssid);
        Ok(())
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Simulate the access point going away.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop_link(&mut self) {
        self.sim_link_up = false;
    }

    /// Join attempts made by the simulation backend.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_attempts(&self) -> u32 {
        self.sim_attempts
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        let conf = Configuration::Client(ClientConfiguration {
            ssid: self
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method: if self.password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPAWPA2Personal
            },
            ..Default::default()
        });
        self.join(&conf).map_err(|e| {
            warn!("WiFi: join failed: {}", e);
            let _ = self.wifi.disconnect();
            ConnectivityError::ConnectionFailed
        })
    }

    #[cfg(target_os = "espidf")]
    fn join(&mut self, conf: &Configuration) -> Result<(), esp_idf_svc::sys::EspError> {
        let timeout = core::time::Duration::from_millis(u64::from(self.timeout_ms));
        self.wifi.set_configuration(conf)?;
        if !self.wifi.is_started()? {
            self.wifi.start()?;
        }
        self.wifi.wifi_mut().connect()?;
        self.wifi
            .wifi_wait_while(|| self.wifi.is_connected().map(|c| !c), Some(timeout))?;
        self.wifi.wait_netif_up()
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        self.sim_attempts = self.sim_attempts.wrapping_add(1);
        self.sim_link_up = true;
        info!("WiFi(sim): joined '{}' (attempt {})", self.ssid, self.sim_attempts);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        let _ = self.wifi.disconnect();
        let _ = self.wifi.stop();
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.sim_link_up = false;
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_link_up
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        if self.platform_is_connected() {
            return Err(ConnectivityError::AlreadyConnected);
        }

        info!("WiFi: connecting to '{}' ({} ms timeout)", self.ssid, self.timeout_ms);
        self.platform_connect()?;
        info!("WiFi: connected to '{}'", self.ssid);
        Ok(())
    }

    fn disconnect(&mut self) {
        if !self.platform_is_connected() {
            return;
        }
        self.platform_disconnect();
        info!("WiFi: disconnected from '{}'", self.ssid);
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
