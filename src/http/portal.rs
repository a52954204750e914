//! Captive portal session.
//!
//! Serves the setup page and its JSON API on the hotspot while the device
//! is unprovisioned, and blocks the boot thread until a connect attempt
//! succeeds.
//!
//! ```text
//!  POST /api/connect ──▶ ProvisioningManager::connect (blocking pool)
//!          │ ok
//!          ├──▶ 200 {success: true, message: <address>}
//!          └──▶ sleep(signal delay) ──▶ Signal::signal(address) ──▶ run_until_connected returns
//! ```
//!
//! The completion signal is raised after a delay so the client receives
//! its response before the caller tears the hotspot and listener down.
//! It fires at most once per session.  The wait has no timeout; an
//! unconfigured device keeps its hotspot up indefinitely.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::runtime::Handle;

use crate::provisioning::ProvisioningManager;

use super::pages;

/// Probe paths used by phones and laptops to detect a captive portal.
pub const PROBE_PATHS: [&str; 4] = [
    "/generate_204",
    "/hotspot-detect.html",
    "/connecttest.txt",
    "/redirect",
];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConnectRequest {
    ssid: String,
    password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ForgetRequest {
    name: String,
}

/// One provisioning attempt: its HTTP surface and its completion signal.
#[derive(Clone)]
pub struct PortalSession {
    provisioning: Arc<ProvisioningManager>,
    connected: Arc<Signal<CriticalSectionRawMutex, String>>,
    fired: Arc<AtomicBool>,
    signal_delay: Duration,
}

impl PortalSession {
    pub fn new(provisioning: Arc<ProvisioningManager>, signal_delay: Duration) -> Self {
        Self {
            provisioning,
            connected: Arc::new(Signal::new()),
            fired: Arc::new(AtomicBool::new(false)),
            signal_delay,
        }
    }

    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .route("/", get(setup_page))
            .route("/api/scan", get(scan))
            .route("/api/connect", post(connect))
            .route("/api/status", get(status))
            .route("/api/saved", get(saved))
            .route("/api/forget", post(forget));
        for path in PROBE_PATHS {
            router = router.route(path, get(redirect_home));
        }
        router.with_state(self.clone())
    }

    /// Serve the portal on `port` and block until a connect succeeds.
    ///
    /// Must be called from outside the runtime.  Returns the acquired address.
    pub fn run_until_connected(&self, runtime: &Handle, port: u16) -> anyhow::Result<String> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = runtime
            .block_on(TcpListener::bind(addr))
            .with_context(|| format!("binding captive portal on {addr}"))?;
        info!("PORTAL: listening on {} (AP '{}')", addr, self.provisioning.ap_ssid());

        let router = self.router();
        let server = runtime.spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                warn!("PORTAL: server stopped: {}", e);
            }
        });

        let address = self.wait_connected();
        server.abort();
        info!("PORTAL: provisioning complete, address {}", address);
        Ok(address)
    }

    /// Block the calling thread until the session completes.
    pub fn wait_connected(&self) -> String {
        futures_lite::future::block_on(self.connected())
    }

    /// Resolves with the acquired address once the session completes.
    pub async fn connected(&self) -> String {
        self.connected.wait().await
    }

    /// Release the waiter after the signal delay.  Later successes are ignored.
    fn schedule_completion(&self, address: String) {
        if self.fired.swap(true, Ordering::AcqRel) {
            return;
        }
        let signal = Arc::clone(&self.connected);
        let delay = self.signal_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            signal.signal(address);
        });
    }
}

// ── Handlers ──────────────────────────────────────────────────

async fn setup_page(State(session): State<PortalSession>) -> Html<String> {
    Html(pages::setup_page(session.provisioning.ap_ssid()))
}

async fn redirect_home() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/")])
}

async fn scan(State(session): State<PortalSession>) -> impl IntoResponse {
    let provisioning = Arc::clone(&session.provisioning);
    let networks = tokio::task::spawn_blocking(move || provisioning.scan_networks())
        .await
        .unwrap_or_else(|e| {
            warn!("PORTAL: scan task failed: {}", e);
            Vec::new()
        });
    Json(json!({ "networks": networks }))
}

async fn connect(State(session): State<PortalSession>, body: String) -> impl IntoResponse {
    let request: ConnectRequest = match serde_json::from_str(&body) {
        Ok(r) => r,
        Err(e) => {
            warn!("PORTAL: bad connect request: {}", e);
            ConnectRequest::default()
        }
    };
    if request.ssid.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "message": "Missing SSID" })),
        );
    }

    let provisioning = Arc::clone(&session.provisioning);
    let ConnectRequest { ssid, password } = request;
    let outcome = tokio::task::spawn_blocking(move || {
        provisioning.connect(&ssid, password.as_deref())
    })
    .await;

    match outcome {
        Ok(Ok(address)) => {
            session.schedule_completion(address.clone());
            (StatusCode::OK, Json(json!({ "success": true, "message": address })))
        }
        Ok(Err(failure)) => (
            StatusCode::OK,
            Json(json!({ "success": false, "message": failure.message() })),
        ),
        Err(e) => {
            warn!("PORTAL: connect task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": "Connection failed" })),
            )
        }
    }
}

async fn status(State(session): State<PortalSession>) -> impl IntoResponse {
    let provisioning = Arc::clone(&session.provisioning);
    let report = tokio::task::spawn_blocking(move || {
        json!({
            "apSsid": provisioning.ap_ssid(),
            "connected": provisioning.is_connected(),
            "currentNetwork": provisioning.current_network(),
            "ip": provisioning.ip_address().map(|ip| ip.to_string()),
        })
    })
    .await;
    match report {
        Ok(report) => (StatusCode::OK, Json(report)),
        Err(e) => {
            warn!("PORTAL: status task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({})))
        }
    }
}

async fn saved(State(session): State<PortalSession>) -> impl IntoResponse {
    let provisioning = Arc::clone(&session.provisioning);
    let networks = tokio::task::spawn_blocking(move || provisioning.saved_networks())
        .await
        .unwrap_or_default();
    Json(json!({ "networks": networks }))
}

async fn forget(State(session): State<PortalSession>, body: String) -> impl IntoResponse {
    let request: ForgetRequest = serde_json::from_str(&body).unwrap_or_default();
    if request.name.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "success": false })));
    }
    let provisioning = Arc::clone(&session.provisioning);
    let success = tokio::task::spawn_blocking(move || provisioning.forget_network(&request.name))
        .await
        .unwrap_or(false);
    (StatusCode::OK, Json(json!({ "success": success })))
}
