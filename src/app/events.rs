//! Outbound application events.
//!
//! The lifecycle and provisioning managers emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (console log, test recorder).

use crate::provisioning::failure::ConnectFailure;
use crate::provisioning::state::ProvisioningState;

/// Structured events emitted by the control plane.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// An app was added to (or replaced in) the registry.
    Registered { name: String },

    /// A switch was requested for a name that is not registered.
    SwitchRejected { name: String },

    /// The active app changed.  `from` is `None` on the first switch.
    Switched { from: Option<String>, to: String },

    /// A best-effort `stop` call failed; the switch went ahead anyway.
    StopFailed { name: String, error: String },

    /// An app failed to start.
    StartFailed { name: String, error: String },

    /// One frame of `update`/`draw` failed.
    FrameFailed { name: String, consecutive: u32, error: String },

    /// The active app produced a good frame after one or more failures.
    Recovered { name: String, after: u32 },

    /// The fallback procedure moved away from a failing app.
    FallbackEngaged { from: String, to: String },

    /// No other app could be started; the failing app stays active.
    FallbackExhausted { name: String },

    /// The provisioning state machine moved.
    ProvisioningChanged { from: ProvisioningState, to: ProvisioningState },

    /// A station connect attempt failed and was classified.
    ConnectFailed { ssid: String, failure: ConnectFailure },

    /// The device joined a network.
    Connected { ssid: String, address: String },
}
