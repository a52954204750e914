//! Provisioning state machine.
//!
//! ```text
//!  UNPROVISIONED ──[ap up]──▶ AP_ACTIVE ──[connect]──▶ CONNECTING ──[ok]──▶ CONNECTED
//!        ▲                      │   ▲                      │
//!        └──────[ap down]───────┘   │                  [failed]
//!                                   │                      ▼
//!                                   └────[ap restarted]── CONNECT_FAILED
//! ```
//!
//! `ConnectFailed` is transient: the manager restarts the hotspot straight
//! away, and only stays there if the restart itself fails.  `Connected` is
//! terminal for the provisioning flow.

use serde::Serialize;

/// Where the device is in the provisioning flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProvisioningState {
    Unprovisioned,
    AccessPointActive,
    Connecting,
    Connected,
    ConnectFailed,
}

/// Inputs that move the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningInput {
    ApStarted,
    ApStopped,
    ConnectRequested,
    ConnectSucceeded,
    ConnectFailed,
}

impl ProvisioningState {
    /// Transition table.  Returns `None` when `input` is not valid here.
    pub fn next(self, input: ProvisioningInput) -> Option<Self> {
        use ProvisioningInput as I;
        use ProvisioningState as S;

        match (self, input) {
            (S::Unprovisioned | S::ConnectFailed, I::ApStarted) => Some(S::AccessPointActive),
            (S::AccessPointActive, I::ApStopped) => Some(S::Unprovisioned),
            // A connect may be requested with or without the hotspot up
            // (e.g. a retry after the hotspot failed to come back).
            (S::AccessPointActive | S::Unprovisioned | S::ConnectFailed, I::ConnectRequested) => {
                Some(S::Connecting)
            }
            (S::Connecting, I::ConnectSucceeded) => Some(S::Connected),
            (S::Connecting, I::ConnectFailed) => Some(S::ConnectFailed),
            _ => None,
        }
    }

    /// The radio is currently serving the hotspot.
    pub fn ap_active(self) -> bool {
        self == Self::AccessPointActive
    }
}
