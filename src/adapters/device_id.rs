//! Device identity derived from the ESP32 factory MAC address.
//!
//! - MQTT client id: all 6 MAC bytes in lowercase hex (`deadbeefcafe`),
//!   unless `client_id` is set in the config.
//! - Network hostname: `doorwatch-xxyyzz` from the last 3 bytes.

use core::fmt::Write;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Twelve hex digits.
pub type ClientId = heapless::String<12>;

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: the buffer is exactly the 6 bytes the call writes.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Lowercase hex of the whole MAC.
pub fn client_id(mac: &MacAddress) -> ClientId {
    let mut id = ClientId::new();
    for b in mac {
        let _ = write!(id, "{:02x}", b);
    }
    id
}

/// Format: `doorwatch-xxyyzz` (lowercase).
pub fn hostname(mac: &MacAddress) -> heapless::String<24> {
    let mut name = heapless::String::<24>::new();
    let _ = write!(name, "doorwatch-{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    name
}

/// The configured id if there is one, otherwise the MAC-derived one.
pub fn resolve_client_id(configured: &str, mac: &MacAddress) -> heapless::String<32> {
    if configured.is_empty() {
        let mut id = heapless::String::new();
        let _ = id.push_str(&client_id(mac));
        id
    } else {
        // Config labels are 32 bytes at most, so this never truncates.
        heapless::String::try_from(configured).unwrap_or_default()
    }
}
