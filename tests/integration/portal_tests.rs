//! Integration tests for the captive portal session.
//!
//! Routes are driven in-process; `nmcli` is the scripted fake runner.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use pixie::http::portal::{PROBE_PATHS, PortalSession};
use pixie::provisioning::ProvisioningManager;
use pixie::provisioning::state::ProvisioningState;

use crate::http_support::{get, post};
use crate::mock_hw::{FakeRunner, RecordingSink, config, fail, ok, unprovisioned_runner};

struct Fixture {
    runner: Arc<FakeRunner>,
    provisioning: Arc<ProvisioningManager>,
    session: PortalSession,
}

fn fixture(delay: Duration) -> Fixture {
    let runner = unprovisioned_runner();
    let provisioning = Arc::new(ProvisioningManager::new(
        &config(),
        runner.clone(),
        RecordingSink::new(),
    ));
    provisioning.start_access_point().unwrap();
    let session = PortalSession::new(Arc::clone(&provisioning), delay);
    Fixture { runner, provisioning, session }
}

#[tokio::test(flavor = "multi_thread")]
async fn setup_page_names_hotspot() {
    let f = fixture(Duration::from_millis(10));
    let reply = get(f.session.router(), "/").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("Pixie-CAFE"));
}

#[tokio::test(flavor = "multi_thread")]
async fn probes_redirect_home() {
    let f = fixture(Duration::from_millis(10));
    for path in PROBE_PATHS {
        let reply = get(f.session.router(), path).await;
        assert_eq!(reply.status, StatusCode::FOUND, "{path}");
        assert_eq!(reply.location.as_deref(), Some("/"), "{path}");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn scan_lists_networks() {
    let f = fixture(Duration::from_millis(10));
    f.runner.on(
        "SSID,SIGNAL,SECURITY,FREQ",
        Ok(ok("Home:40:WPA2:x\nHome:75:WPA2:x\nPixie-CAFE:99::x\n")),
    );

    let body = get(f.session.router(), "/api/scan").await.json();

    assert_eq!(
        body,
        serde_json::json!({ "networks": [{ "ssid": "Home", "signal": 75, "secure": true }] })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn status_reports_hotspot_and_link() {
    let f = fixture(Duration::from_millis(10));
    f.runner.on("active,ssid", Ok(ok("yes:Home\n")));

    let body = get(f.session.router(), "/api/status").await.json();

    assert_eq!(body["apSsid"], "Pixie-CAFE");
    assert_eq!(body["connected"], false);
    assert_eq!(body["currentNetwork"], "Home");
    assert_eq!(body["ip"], "192.168.1.23");
}

#[tokio::test(flavor = "multi_thread")]
async fn connect_requires_ssid() {
    let f = fixture(Duration::from_millis(10));
    for body in [r#"{"password":"x"}"#, r#"{"ssid":""}"#, "not json"] {
        let reply = post(f.session.router(), "/api/connect", body).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(reply.json()["message"], "Missing SSID");
    }
    assert_eq!(f.runner.called("dev wifi connect"), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn wrong_password_is_reported_and_hotspot_restored() {
    let f = fixture(Duration::from_millis(10));
    f.runner.on("dev wifi connect", Ok(fail("Secrets were required, but not provided")));

    let reply = post(
        f.session.router(),
        "/api/connect",
        r#"{"ssid":"Home","password":"wrongpass"}"#,
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK);
    let body = reply.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Incorrect password");
    assert_eq!(f.provisioning.state(), ProvisioningState::AccessPointActive);

    // No completion is signalled for a failed attempt.
    let waited = tokio::time::timeout(Duration::from_millis(100), f.session.connected()).await;
    assert!(waited.is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn saved_and_forget() {
    let f = fixture(Duration::from_millis(10));
    f.runner.on(
        "NAME,TYPE connection show",
        Ok(ok("Home:802-11-wireless\npixie-hotspot:802-11-wireless\n")),
    );

    let saved = get(f.session.router(), "/api/saved").await.json();
    assert_eq!(saved, serde_json::json!({ "networks": ["Home"] }));

    let forgot = post(f.session.router(), "/api/forget", r#"{"name":"Home"}"#).await;
    assert_eq!(forgot.json()["success"], true);

    let refused = post(f.session.router(), "/api/forget", r#"{"name":"pixie-hotspot"}"#).await;
    assert_eq!(refused.json()["success"], false);

    let missing = post(f.session.router(), "/api/forget", "{}").await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn success_responds_before_completion_fires() {
    let delay = Duration::from_millis(300);
    let f = fixture(delay);

    let started = Instant::now();
    let reply = post(
        f.session.router(),
        "/api/connect",
        r#"{"ssid":"Home","password":"secret"}"#,
    )
    .await;
    let body = reply.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "192.168.1.23");

    // Not released synchronously with the response.
    let early = tokio::time::timeout(Duration::from_millis(50), f.session.connected()).await;
    assert!(early.is_err());

    let address = tokio::time::timeout(Duration::from_secs(3), f.session.connected())
        .await
        .unwrap();
    assert_eq!(address, "192.168.1.23");
    assert!(started.elapsed() >= delay);
    assert_eq!(f.provisioning.state(), ProvisioningState::Connected);
}

/// Boot with no network → AP active → client connects → blocking call
/// returns the address and the hotspot is gone.
#[test]
fn end_to_end_provisioning() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let f = fixture(Duration::from_millis(200));
    assert!(!f.provisioning.is_connected());
    assert_eq!(f.provisioning.state(), ProvisioningState::AccessPointActive);

    let waiter = {
        let session = f.session.clone();
        let handle = runtime.handle().clone();
        std::thread::spawn(move || session.run_until_connected(&handle, 0))
    };

    // Concurrent status polling while the connect is in flight.
    let router = f.session.router();
    let reply = runtime.block_on(async {
        let scan = tokio::spawn(get(router.clone(), "/api/scan"));
        let status = tokio::spawn(get(router.clone(), "/api/status"));
        let connect = post(router.clone(), "/api/connect", r#"{"ssid":"Home","password":"secret"}"#).await;
        assert_eq!(scan.await.unwrap().status, StatusCode::OK);
        assert_eq!(status.await.unwrap().status, StatusCode::OK);
        connect
    });
    assert_eq!(reply.json()["success"], true);

    let address = waiter.join().unwrap().unwrap();
    assert_eq!(address, "192.168.1.23");

    f.provisioning.stop_access_point();
    assert_eq!(f.provisioning.state(), ProvisioningState::Connected);
    assert!(f.runner.called("connection down pixie-hotspot") >= 1);
    assert!(f.runner.called("iptables -t nat -D PREROUTING") >= 1);
}
