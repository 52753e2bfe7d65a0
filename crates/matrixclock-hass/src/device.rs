//! Device identity
//!
//! All entity topics are namespaced by a stable per-device identifier so
//! multiple devices can share one broker without collisions.

use core::fmt::Write;
use heapless::String;

/// 8 lowercase hex digits derived from the device MAC address.
pub type HostId = String<8>;

/// Derive the host id from the first 4 bytes of the hardware MAC address.
pub fn host_id_from_mac(mac: &[u8; 6]) -> HostId {
    let mut id = HostId::new();
    // 8 chars into an 8-char buffer, cannot overflow
    let _ = write!(id, "{:02x}{:02x}{:02x}{:02x}", mac[0], mac[1], mac[2], mac[3]);
    id
}

/// Identity block shared by every entity of this device.
///
/// Feeds topic derivation and the `device` section of discovery documents.
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    /// Stable per-device identifier, see [`host_id_from_mac`]
    pub host_id: HostId,
    /// Prefix for entity names and object ids (e.g. `ledclock`)
    pub entity_prefix: &'static str,
    /// Discovery topic root (conventionally `homeassistant`)
    pub discovery_prefix: &'static str,
    /// Model name reported in discovery
    pub model: &'static str,
    /// Manufacturer name reported in discovery
    pub manufacturer: &'static str,
    /// Firmware version reported in discovery
    pub sw_version: &'static str,
}

impl DeviceIdentity {
    pub const fn new(host_id: HostId, entity_prefix: &'static str) -> Self {
        Self {
            host_id,
            entity_prefix,
            discovery_prefix: "homeassistant",
            model: "matrixclock",
            manufacturer: "matrixclock",
            sw_version: "0.0.0",
        }
    }

    #[must_use]
    pub const fn with_discovery_prefix(mut self, prefix: &'static str) -> Self {
        self.discovery_prefix = prefix;
        self
    }

    #[must_use]
    pub const fn with_model(mut self, model: &'static str) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub const fn with_manufacturer(mut self, manufacturer: &'static str) -> Self {
        self.manufacturer = manufacturer;
        self
    }

    #[must_use]
    pub const fn with_sw_version(mut self, sw_version: &'static str) -> Self {
        self.sw_version = sw_version;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_id_is_lowercase_hex_of_first_four_bytes() {
        let id = host_id_from_mac(&[0xDE, 0xAD, 0x0B, 0x1E, 0x99, 0x42]);
        assert_eq!(id.as_str(), "dead0b1e");
    }
}
