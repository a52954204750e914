//! Scan result parsing.
//!
//! Turns `nmcli -t -f SSID,SIGNAL,SECURITY,FREQ dev wifi list` output into
//! one [`Network`] per SSID: strongest signal wins, the device's own
//! hotspot and hidden (empty) SSIDs are dropped, strongest first.

use std::collections::HashMap;

use serde::Serialize;

use super::nmcli;

/// A visible network, as shown in the setup page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Network {
    pub ssid: String,
    /// Signal quality 0–100.
    pub signal: u8,
    pub secure: bool,
}

/// Parse one terse record.  Records with fewer than three fields are ignored.
fn parse_record(fields: &[String]) -> Option<Network> {
    let [ssid, signal, security, ..] = fields else {
        return None;
    };
    Some(Network {
        ssid: ssid.clone(),
        signal: signal.trim().parse::<u8>().unwrap_or(0).min(100),
        secure: !security.is_empty() && security != "--",
    })
}

/// Deduplicated, sorted scan results excluding `own_ssid`.
pub fn collect_networks(stdout: &str, own_ssid: &str) -> Vec<Network> {
    let mut by_ssid: HashMap<String, Network> = HashMap::new();
    for network in nmcli::records(stdout).filter_map(|f| parse_record(&f)) {
        if network.ssid.is_empty() || network.ssid == own_ssid {
            continue;
        }
        match by_ssid.get(&network.ssid) {
            Some(existing) if existing.signal >= network.signal => {}
            _ => {
                by_ssid.insert(network.ssid.clone(), network);
            }
        }
    }
    let mut networks: Vec<Network> = by_ssid.into_values().collect();
    networks.sort_by(|a, b| b.signal.cmp(&a.signal).then_with(|| a.ssid.cmp(&b.ssid)));
    networks
}
