//! Control surface: remote query and switch of the active app.
//!
//! A thin façade over [`SharedLifecycle`].  It has no state of its own
//! besides the optional frame feed used by the emulator viewer.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::adapters::matrix::FrameFeed;
use crate::app::lifecycle::SharedLifecycle;
use crate::error::LifecycleError;

use super::pages;

#[derive(Clone)]
struct ControlState {
    lifecycle: SharedLifecycle,
    feed: Option<FrameFeed>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AppStatus {
    current_app: Option<String>,
    available_apps: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SwitchRequest {
    app: String,
}

/// Build the control router.  `feed` enables `GET /api/frame`.
pub fn router(lifecycle: SharedLifecycle, feed: Option<FrameFeed>) -> Router {
    Router::new()
        .route("/", get(remote_page))
        .route("/api/status", get(status))
        .route("/api/switch", post(switch))
        .route("/api/frame", get(frame))
        .with_state(ControlState { lifecycle, feed })
}

async fn remote_page() -> Html<&'static str> {
    Html(pages::REMOTE_PAGE)
}

async fn status(State(state): State<ControlState>) -> impl IntoResponse {
    let lifecycle = state.lifecycle.clone();
    // The render thread holds the lock for a whole frame.
    let snapshot = tokio::task::spawn_blocking(move || {
        let manager = lifecycle.lock();
        AppStatus {
            current_app: manager.current_app().map(str::to_owned),
            available_apps: manager.available_apps(),
        }
    })
    .await;

    match snapshot {
        Ok(status) => Json(status).into_response(),
        Err(e) => {
            warn!("HTTP: status task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn switch(State(state): State<ControlState>, body: String) -> impl IntoResponse {
    let request: SwitchRequest = match serde_json::from_str(&body) {
        Ok(r) => r,
        Err(e) => {
            warn!("HTTP: bad switch request: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "error", "message": "Missing app name" })),
            );
        }
    };

    let lifecycle = state.lifecycle.clone();
    let name = request.app.clone();
    // `start` may do I/O; keep it off the async workers.
    let outcome = tokio::task::spawn_blocking(move || {
        let mut manager = lifecycle.lock();
        manager
            .switch_to(&name)
            .map(|()| manager.current_app().map(str::to_owned))
    })
    .await;

    match outcome {
        Ok(Ok(current)) => {
            info!("HTTP: switched to '{}'", request.app);
            (
                StatusCode::OK,
                Json(json!({ "status": "ok", "currentApp": current })),
            )
        }
        Ok(Err(e @ LifecycleError::UnknownApp(_))) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "status": "error", "message": e.to_string() })),
        ),
        Ok(Err(e)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": "error", "message": e.to_string() })),
        ),
        Err(e) => {
            warn!("HTTP: switch task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": "switch failed" })),
            )
        }
    }
}

async fn frame(State(state): State<ControlState>) -> impl IntoResponse {
    match &state.feed {
        Some(feed) => Json(feed.latest()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
