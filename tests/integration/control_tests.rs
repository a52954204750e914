//! Integration tests for the control surface routes.

use axum::http::StatusCode;
use pixie::adapters::matrix::FrameBufferDisplay;
use pixie::app::lifecycle::{LifecycleManager, SharedLifecycle};
use pixie::http::control;

use crate::http_support::{get, post};
use crate::mock_hw::{AppScript, MockDisplay, RecordingSink, ScriptedApp};

use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

fn shared() -> (SharedLifecycle, Arc<AppScript>, Arc<AppScript>) {
    let mut m = LifecycleManager::new(Box::new(MockDisplay::new()), RecordingSink::new());
    let (clock, clock_script) = ScriptedApp::new();
    let (weather, weather_script) = ScriptedApp::new();
    m.register("clock", clock).unwrap();
    m.register("weather", weather).unwrap();
    m.switch_to("clock").unwrap();
    (SharedLifecycle::new(m), clock_script, weather_script)
}

#[tokio::test(flavor = "multi_thread")]
async fn status_lists_apps() {
    let (lifecycle, _, _) = shared();
    let body = get(control::router(lifecycle, None), "/api/status").await.json();
    assert_eq!(
        body,
        serde_json::json!({ "currentApp": "clock", "availableApps": ["clock", "weather"] })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn switch_changes_active_app() {
    let (lifecycle, clock, weather) = shared();
    let router = control::router(lifecycle.clone(), None);

    let reply = post(router, "/api/switch", r#"{"app":"weather"}"#).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.json(),
        serde_json::json!({ "status": "ok", "currentApp": "weather" })
    );
    assert_eq!(lifecycle.current_app().as_deref(), Some("weather"));
    assert_eq!(clock.stops(), 1);
    assert_eq!(weather.starts(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_app_is_not_found() {
    let (lifecycle, _, _) = shared();
    let reply = post(control::router(lifecycle.clone(), None), "/api/switch", r#"{"app":"radar"}"#).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(lifecycle.current_app().as_deref(), Some("clock"));
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_switch_is_bad_request() {
    let (lifecycle, _, _) = shared();
    for body in ["", "{}", r#"{"app":7}"#, "nonsense"] {
        let reply = post(control::router(lifecycle.clone(), None), "/api/switch", body).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{body:?}");
    }
    assert_eq!(lifecycle.current_app().as_deref(), Some("clock"));
}

#[tokio::test(flavor = "multi_thread")]
async fn remote_page_is_served() {
    let (lifecycle, _, _) = shared();
    let reply = get(control::router(lifecycle, None), "/").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("/api/switch"));
}

#[tokio::test(flavor = "multi_thread")]
async fn frame_requires_emulator_feed() {
    let (lifecycle, _, _) = shared();
    let reply = get(control::router(lifecycle, None), "/api/frame").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn frame_serves_last_refresh() {
    let display = FrameBufferDisplay::new(8, 4);
    let feed = display.feed();
    let mut m = LifecycleManager::new(Box::new(display), RecordingSink::new());
    m.register("clock", ScriptedApp::new().0).unwrap();
    m.switch_to("clock").unwrap();
    m.step_frame();
    let lifecycle = SharedLifecycle::new(m);

    let body = get(control::router(lifecycle, Some(feed)), "/api/frame").await.json();

    assert_eq!(body["width"], 8);
    assert_eq!(body["height"], 4);
    let pixels = body["pixels"].as_array().unwrap();
    assert_eq!(pixels.len(), 32);
    // ScriptedApp draws white at (1, 1).
    assert_eq!(pixels[8 + 1], serde_json::json!([255, 255, 255]));
    assert_eq!(pixels[0], serde_json::json!([0, 0, 0]));
}

#[tokio::test(flavor = "current_thread")]
async fn status_does_not_stall_runtime_during_a_frame() {
    let (lifecycle, _, _) = shared();

    // Stand in for the render thread sitting inside a slow draw.
    let (locked_tx, locked_rx) = mpsc::channel();
    let held = lifecycle.clone();
    let render = std::thread::spawn(move || {
        let _frame = held.lock();
        locked_tx.send(()).unwrap();
        std::thread::sleep(Duration::from_millis(500));
    });
    locked_rx.recv().unwrap();

    let request = tokio::spawn(get(control::router(lifecycle, None), "/api/status"));
    let started = Instant::now();
    tokio::time::sleep(Duration::from_millis(10)).await;
    let waited = started.elapsed();

    assert!(waited < Duration::from_millis(250), "timer delayed by {waited:?}");
    let reply = request.await.unwrap();
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["currentApp"], "clock");
    render.join().unwrap();
}
