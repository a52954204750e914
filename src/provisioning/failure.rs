//! Connect-failure taxonomy.
//!
//! `nmcli` reports failures as free text on stderr.  The portal only ever
//! shows one of four fixed messages, chosen here.

use core::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectFailure {
    IncorrectPassword,
    NetworkNotFound,
    TimedOut,
    Failed,
}

impl ConnectFailure {
    /// Classify raw `nmcli` error output.
    pub fn classify(stderr: &str) -> Self {
        let lower = stderr.to_lowercase();
        if lower.contains("secrets were required") || lower.contains("secret") {
            Self::IncorrectPassword
        } else if stderr.contains("No network with SSID") {
            Self::NetworkNotFound
        } else if lower.contains("timeout") || lower.contains("timed out") {
            Self::TimedOut
        } else {
            Self::Failed
        }
    }

    /// User-facing message shown in the setup page.
    pub fn message(self) -> &'static str {
        match self {
            Self::IncorrectPassword => "Incorrect password",
            Self::NetworkNotFound => "Network not found",
            Self::TimedOut => "Connection timed out",
            Self::Failed => "Connection failed, please try again",
        }
    }
}

impl fmt::Display for ConnectFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
