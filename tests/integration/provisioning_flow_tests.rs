//! Integration tests for the provisioning manager against a fake `nmcli`.
//!
//! Verifies the hotspot ⇄ station sequence: AP up, connect attempt, failure
//! classification, AP restore, and the read-only queries the portal uses.

use std::sync::Arc;

use pixie::app::events::AppEvent;
use pixie::error::{CommandError, ProvisioningError};
use pixie::provisioning::ProvisioningManager;
use pixie::provisioning::failure::ConnectFailure;
use pixie::provisioning::scan::Network;
use pixie::provisioning::state::ProvisioningState;

use crate::mock_hw::{FakeRunner, RecordingSink, config, fail, ok, unprovisioned_runner};

fn manager(runner: &Arc<FakeRunner>, sink: &Arc<RecordingSink>) -> ProvisioningManager {
    ProvisioningManager::new(&config(), runner.clone(), sink.clone())
}

// ── Identity and connectivity ─────────────────────────────────

#[test]
fn hotspot_name_derives_from_mac() {
    let runner = unprovisioned_runner();
    let m = manager(&runner, &RecordingSink::new());
    assert_eq!(m.ap_ssid(), "Pixie-CAFE");
}

#[test]
fn own_hotspot_does_not_count_as_connected() {
    let runner = unprovisioned_runner();
    let m = manager(&runner, &RecordingSink::new());
    assert!(!m.is_connected());
}

#[test]
fn active_station_link_counts_as_connected() {
    let runner = unprovisioned_runner();
    runner.on(
        "connection show --active",
        Ok(ok("802-3-ethernet:activated:Wired\n802-11-wireless:activated:Home\n")),
    );
    let m = manager(&runner, &RecordingSink::new());
    assert!(m.is_connected());
}

#[test]
fn activating_link_is_not_yet_connected() {
    let runner = unprovisioned_runner();
    runner.on("connection show --active", Ok(ok("802-11-wireless:activating:Home\n")));
    let m = manager(&runner, &RecordingSink::new());
    assert!(!m.is_connected());
}

#[test]
fn connectivity_check_timeout_reads_as_offline() {
    let runner = unprovisioned_runner();
    runner.on("connection show --active", Err(CommandError::TimedOut));
    let m = manager(&runner, &RecordingSink::new());
    assert!(!m.is_connected());
}

#[test]
fn current_network_and_address() {
    let runner = unprovisioned_runner();
    runner.on("active,ssid", Ok(ok("no:Cafe\nyes:Home\n")));
    let m = manager(&runner, &RecordingSink::new());
    assert_eq!(m.current_network().as_deref(), Some("Home"));
    assert_eq!(m.ip_address().map(|ip| ip.to_string()).as_deref(), Some("192.168.1.23"));
}

// ── Access point ──────────────────────────────────────────────

#[test]
fn start_access_point_replaces_stale_profile() {
    let runner = unprovisioned_runner();
    let sink = RecordingSink::new();
    let m = manager(&runner, &sink);

    m.start_access_point().unwrap();

    assert_eq!(m.state(), ProvisioningState::AccessPointActive);
    let delete = runner.position("connection delete pixie-hotspot").unwrap();
    let add = runner.position("connection add type wifi").unwrap();
    let up = runner.position("connection up pixie-hotspot").unwrap();
    assert!(delete < add && add < up);
    assert_eq!(runner.called("ssid Pixie-CAFE"), 1);
    assert_eq!(runner.called("ipv4.addresses 192.168.4.1/24"), 1);
    assert_eq!(runner.called("iptables -t nat -A PREROUTING"), 1);
    assert!(sink.events().contains(&AppEvent::ProvisioningChanged {
        from: ProvisioningState::Unprovisioned,
        to: ProvisioningState::AccessPointActive,
    }));
}

#[test]
fn failed_profile_creation_is_reported() {
    let runner = unprovisioned_runner();
    runner.on("connection add", Ok(fail("Error: invalid property")));
    let m = manager(&runner, &RecordingSink::new());

    assert_eq!(m.start_access_point(), Err(ProvisioningError::ApCreateFailed));
    assert_eq!(m.state(), ProvisioningState::Unprovisioned);
    assert_eq!(runner.called("connection up"), 0);
}

#[test]
fn failed_activation_is_reported() {
    let runner = unprovisioned_runner();
    runner.on("connection up", Ok(fail("Error: no device")));
    let m = manager(&runner, &RecordingSink::new());

    assert_eq!(m.start_access_point(), Err(ProvisioningError::ApActivateFailed));
    assert_eq!(m.state(), ProvisioningState::Unprovisioned);
}

#[test]
fn stop_without_ap_is_harmless() {
    let runner = unprovisioned_runner();
    runner.on("connection down", Ok(fail("Error: not an active connection")));
    runner.on("connection delete", Ok(fail("Error: unknown connection")));
    let sink = RecordingSink::new();
    let m = manager(&runner, &sink);

    m.stop_access_point();
    m.stop_access_point();

    assert_eq!(m.state(), ProvisioningState::Unprovisioned);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ProvisioningChanged { .. })),
        0
    );
}

#[test]
fn stop_tears_down_redirect_and_profile() {
    let runner = unprovisioned_runner();
    let m = manager(&runner, &RecordingSink::new());
    m.start_access_point().unwrap();

    m.stop_access_point();

    assert_eq!(m.state(), ProvisioningState::Unprovisioned);
    // One delete clears a leftover at start, one removes ours at stop.
    assert_eq!(runner.called("iptables -t nat -D PREROUTING"), 2);
    assert_eq!(runner.called("connection down pixie-hotspot"), 1);
}

#[test]
fn start_clears_leftover_redirect_before_adding() {
    let runner = unprovisioned_runner();
    let m = manager(&runner, &RecordingSink::new());

    m.start_access_point().unwrap();

    let delete = runner.position("iptables -t nat -D PREROUTING -i wlan0").unwrap();
    let add = runner.position("iptables -t nat -A PREROUTING -i wlan0").unwrap();
    assert!(delete < add);
    assert_eq!(runner.called("--to-destination 192.168.4.1:80"), 2);
}

// ── Scan ──────────────────────────────────────────────────────

#[test]
fn scan_dedups_and_hides_own_hotspot() {
    let runner = unprovisioned_runner();
    runner.on(
        "SSID,SIGNAL,SECURITY,FREQ",
        Ok(ok("Home:40:WPA2:2412 MHz\nPixie-CAFE:99::2412 MHz\nHome:75:WPA2:5180 MHz\n:60:WPA2:2437 MHz\nCafe:20:--:2462 MHz\n")),
    );
    let m = manager(&runner, &RecordingSink::new());

    let networks = m.scan_networks();

    assert_eq!(
        networks,
        vec![
            Network { ssid: "Home".into(), signal: 75, secure: true },
            Network { ssid: "Cafe".into(), signal: 20, secure: false },
        ]
    );
    let rescan = runner.position("wifi rescan").unwrap();
    let list = runner.position("SSID,SIGNAL").unwrap();
    assert!(rescan < list);
}

#[test]
fn scan_failure_yields_empty_list() {
    let runner = unprovisioned_runner();
    runner.on("SSID,SIGNAL,SECURITY,FREQ", Err(CommandError::TimedOut));
    let m = manager(&runner, &RecordingSink::new());
    assert!(m.scan_networks().is_empty());
}

// ── Connect ───────────────────────────────────────────────────

#[test]
fn connect_success_returns_address() {
    let runner = unprovisioned_runner();
    let sink = RecordingSink::new();
    let m = manager(&runner, &sink);
    m.start_access_point().unwrap();

    let address = m.connect("Home", Some("secret")).unwrap();

    assert_eq!(address, "192.168.1.23");
    assert_eq!(m.state(), ProvisioningState::Connected);
    assert_eq!(m.address().as_deref(), Some("192.168.1.23"));
    assert_eq!(runner.called("dev wifi connect Home password secret ifname wlan0"), 1);
    // Hotspot goes down before the station attempt.
    let down = runner.position("connection down pixie-hotspot").unwrap();
    let connect = runner.position("dev wifi connect").unwrap();
    assert!(down < connect);
    assert!(sink.events().contains(&AppEvent::Connected {
        ssid: "Home".into(),
        address: "192.168.1.23".into(),
    }));
}

#[test]
fn open_network_connects_without_password_argument() {
    let runner = unprovisioned_runner();
    let m = manager(&runner, &RecordingSink::new());
    m.start_access_point().unwrap();

    m.connect("Cafe", Some("")).unwrap();

    assert_eq!(runner.called("dev wifi connect Cafe ifname wlan0"), 1);
    assert_eq!(runner.called("password"), 0);
}

#[test]
fn connect_without_address_reports_connected() {
    let runner = unprovisioned_runner();
    runner.on("IP4.ADDRESS", Ok(ok("")));
    let m = manager(&runner, &RecordingSink::new());
    m.start_access_point().unwrap();

    assert_eq!(m.connect("Home", None).unwrap(), "Connected");
}

#[test]
fn wrong_password_restores_hotspot() {
    let runner = unprovisioned_runner();
    runner.on(
        "dev wifi connect",
        Ok(fail("Error: Connection activation failed: (7) Secrets were required, but not provided.")),
    );
    let sink = RecordingSink::new();
    let m = manager(&runner, &sink);
    m.start_access_point().unwrap();

    let failure = m.connect("Home", Some("wrongpass")).unwrap_err();

    assert_eq!(failure, ConnectFailure::IncorrectPassword);
    assert_eq!(failure.message(), "Incorrect password");
    assert_eq!(m.state(), ProvisioningState::AccessPointActive);
    assert_eq!(runner.called("connection up pixie-hotspot"), 2);
    assert_eq!(m.address(), None);
    assert!(sink.events().contains(&AppEvent::ConnectFailed {
        ssid: "Home".into(),
        failure: ConnectFailure::IncorrectPassword,
    }));
}

#[test]
fn failure_taxonomy_is_applied() {
    let cases = [
        (Ok(fail("Error: No network with SSID 'Nope' found.")), ConnectFailure::NetworkNotFound),
        (Ok(fail("Error: Timeout expired (90 seconds)")), ConnectFailure::TimedOut),
        (Err(CommandError::TimedOut), ConnectFailure::TimedOut),
        (Ok(fail("Error: device busy")), ConnectFailure::Failed),
        (Err(CommandError::Spawn("nmcli: not found".into())), ConnectFailure::Failed),
    ];
    for (response, expected) in cases {
        let runner = unprovisioned_runner();
        runner.on("dev wifi connect", response);
        let m = manager(&runner, &RecordingSink::new());
        m.start_access_point().unwrap();

        assert_eq!(m.connect("Nope", Some("pw")).unwrap_err(), expected);
        assert_eq!(m.state(), ProvisioningState::AccessPointActive);
    }
}

#[test]
fn retry_after_failure_can_succeed() {
    let runner = unprovisioned_runner();
    runner.once("dev wifi connect", Ok(fail("Secrets were required")));
    let m = manager(&runner, &RecordingSink::new());
    m.start_access_point().unwrap();

    assert!(m.connect("Home", Some("wrong")).is_err());
    assert_eq!(m.connect("Home", Some("right")).unwrap(), "192.168.1.23");
    assert_eq!(m.state(), ProvisioningState::Connected);
}

#[test]
fn failed_restore_leaves_connect_failed() {
    let runner = unprovisioned_runner();
    let m = manager(&runner, &RecordingSink::new());
    m.start_access_point().unwrap();
    runner.on("dev wifi connect", Ok(fail("Error: device busy")));
    runner.on("connection up", Ok(fail("Error: no device")));

    assert!(m.connect("Home", None).is_err());
    assert_eq!(m.state(), ProvisioningState::ConnectFailed);
}

#[test]
fn connect_when_connected_is_a_no_op() {
    let runner = unprovisioned_runner();
    let m = manager(&runner, &RecordingSink::new());
    m.start_access_point().unwrap();
    m.connect("Home", Some("secret")).unwrap();

    assert_eq!(m.connect("Other", Some("pw")).unwrap(), "192.168.1.23");
    assert_eq!(runner.called("dev wifi connect"), 1);
}

// ── Saved profiles ────────────────────────────────────────────

#[test]
fn saved_networks_exclude_hotspot_and_wired() {
    let runner = unprovisioned_runner();
    runner.on(
        "NAME,TYPE connection show",
        Ok(ok("Home:802-11-wireless\npixie-hotspot:802-11-wireless\nWired:802-3-ethernet\nLab\\:2:802-11-wireless\n")),
    );
    let m = manager(&runner, &RecordingSink::new());
    assert_eq!(m.saved_networks(), ["Home", "Lab:2"]);
}

#[test]
fn forget_deletes_profile_but_never_the_hotspot() {
    let runner = unprovisioned_runner();
    let m = manager(&runner, &RecordingSink::new());

    assert!(m.forget_network("Home"));
    assert!(!m.forget_network("pixie-hotspot"));
    assert_eq!(runner.called("connection delete Home"), 1);
    assert_eq!(runner.called("connection delete pixie-hotspot"), 0);
}

#[test]
fn forget_reports_nmcli_failure() {
    let runner = unprovisioned_runner();
    runner.on("connection delete Ghost", Ok(fail("Error: unknown connection 'Ghost'")));
    let m = manager(&runner, &RecordingSink::new());
    assert!(!m.forget_network("Ghost"));
}
