//! Device identity derived from the wireless interface MAC address.
//!
//! Produces a stable, human-readable hotspot name in the form `Pixie-XXXX`
//! (last 2 bytes of the 6-byte MAC in uppercase hex). This name is:
//! - Deterministic across reboots (burned-in interface MAC)
//! - Used as the provisioning AP SSID
//! - Embedded in the setup QR payload

use core::fmt::Write;

/// Fixed-size AP SSID string: "Pixie-XXXX" (10 chars).
pub type ApSsid = heapless::String<16>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Name used when the MAC cannot be read.
pub const FALLBACK_AP_SSID: &str = "Pixie-0000";

/// Parse `aa:bb:cc:dd:ee:ff` (case-insensitive).  `nmcli -t` escapes the
/// colons as `\:`, which is accepted too.
pub fn parse_mac(text: &str) -> Option<MacAddress> {
    let cleaned = text.trim().replace("\\:", ":");
    let mut mac: MacAddress = [0; 6];
    let mut parts = cleaned.split(':');
    for byte in &mut mac {
        *byte = u8::from_str_radix(parts.next()?, 16).ok()?;
    }
    parts.next().is_none().then_some(mac)
}

/// Derive the AP SSID from the last 2 MAC bytes.
/// Format: `Pixie-XXXX` (e.g., `Pixie-CAFE`).
pub fn ap_ssid(mac: &MacAddress) -> ApSsid {
    let mut id = ApSsid::new();
    let _ = write!(id, "Pixie-{:02X}{:02X}", mac[4], mac[5]);
    id
}

pub fn fallback_ap_ssid() -> ApSsid {
    let mut id = ApSsid::new();
    let _ = id.push_str(FALLBACK_AP_SSID);
    id
}
