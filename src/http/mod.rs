//! HTTP surfaces.
//!
//! | Module      | Port           | Lifetime                       |
//! |-------------|----------------|--------------------------------|
//! | [`control`] | 5000 (5002 em) | whole process                  |
//! | [`portal`]  | 80             | only while provisioning        |

pub mod control;
pub mod pages;
pub mod portal;

use std::net::SocketAddr;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

/// Bind `0.0.0.0:port` and serve `router` until the task is dropped.
pub async fn serve(router: Router, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    log::info!("HTTP: listening on {}", addr);
    axum::serve(listener, router).await?;
    Ok(())
}
