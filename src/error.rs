//! Unified error types for the Pixie control plane.
//!
//! One enum per subsystem, each with a hand-written [`Display`] so log lines
//! and HTTP messages read the same.  Application callbacks and the binary use
//! `anyhow`; everything the core itself can fail with lives here.
//!
//! [`Display`]: core::fmt::Display

use core::fmt;

// ---------------------------------------------------------------------------
// Lifecycle errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The app cannot be registered under the given name.
    InvalidApp(String),
    /// No app is registered under the given name.
    UnknownApp(String),
    /// The render loop was asked to run with nothing to render.
    NoActiveApp,
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidApp(reason) => write!(f, "invalid app: {reason}"),
            Self::UnknownApp(name) => write!(f, "app '{name}' not found"),
            Self::NoActiveApp => f.write_str("no active app"),
        }
    }
}

impl std::error::Error for LifecycleError {}

// ---------------------------------------------------------------------------
// Display errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayError {
    /// The panel device could not be opened.
    Open(String),
    /// Pushing a frame to the panel failed.
    Refresh(String),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(msg) => write!(f, "display open failed: {msg}"),
            Self::Refresh(msg) => write!(f, "display refresh failed: {msg}"),
        }
    }
}

impl std::error::Error for DisplayError {}

// ---------------------------------------------------------------------------
// External command errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The program could not be started at all.
    Spawn(String),
    /// The program ran past its deadline and was killed.
    TimedOut,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(msg) => write!(f, "spawn failed: {msg}"),
            Self::TimedOut => write!(f, "command timed out"),
        }
    }
}

impl std::error::Error for CommandError {}

// ---------------------------------------------------------------------------
// Provisioning errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningError {
    /// The hotspot connection profile could not be created.
    ApCreateFailed,
    /// The hotspot profile exists but could not be brought up.
    ApActivateFailed,
}

impl fmt::Display for ProvisioningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApCreateFailed => write!(f, "failed to create AP connection"),
            Self::ApActivateFailed => write!(f, "failed to activate AP"),
        }
    }
}

impl std::error::Error for ProvisioningError {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    Io(std::io::Error),
    /// The config file is not valid JSON for [`PixieConfig`](crate::config::PixieConfig).
    Parse(serde_json::Error),
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "config read failed: {e}"),
            Self::Parse(e) => write!(f, "config parse failed: {e}"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}
