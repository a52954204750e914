//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured control-plane events to
//! the `log` facade (console via `env_logger` in production).
//! A remote-viewer adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] as one tagged line.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&self, event: &AppEvent) {
        match event {
            AppEvent::Registered { name } => {
                info!("APP | registered '{}'", name);
            }
            AppEvent::SwitchRejected { name } => {
                warn!("APP | switch rejected: '{}' not found", name);
            }
            AppEvent::Switched { from, to } => {
                info!("APP | {} -> {}", from.as_deref().unwrap_or("<none>"), to);
            }
            AppEvent::StopFailed { name, error } => {
                warn!("APP | stop '{}' failed (ignored): {}", name, error);
            }
            AppEvent::StartFailed { name, error } => {
                warn!("APP | start '{}' failed: {}", name, error);
            }
            AppEvent::FrameFailed { name, consecutive, error } => {
                warn!("FRAME | '{}' failed ({} in a row): {}", name, consecutive, error);
            }
            AppEvent::Recovered { name, after } => {
                info!("FRAME | '{}' recovered after {} failed frame(s)", name, after);
            }
            AppEvent::FallbackEngaged { from, to } => {
                warn!("APP | fallback '{}' -> '{}'", from, to);
            }
            AppEvent::FallbackExhausted { name } => {
                warn!("APP | fallback exhausted, staying on '{}'", name);
            }
            AppEvent::ProvisioningChanged { from, to } => {
                info!("NET | {:?} -> {:?}", from, to);
            }
            AppEvent::ConnectFailed { ssid, failure } => {
                warn!("NET | connect '{}' failed: {}", ssid, failure);
            }
            AppEvent::Connected { ssid, address } => {
                info!("NET | connected to '{}' as {}", ssid, address);
            }
        }
    }
}
