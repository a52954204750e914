//! System configuration parameters
//!
//! All tunable parameters for the Pixie controller.
//! Values come from an optional JSON file; any field left out keeps its default.

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable consulted when no `--config` path is given.
pub const CONFIG_ENV_VAR: &str = "PIXIE_CONFIG";

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PixieConfig {
    // --- Network ---
    /// Wireless interface managed by NetworkManager
    pub wifi_interface: String,
    /// Reserved connection profile name for the provisioning hotspot
    pub ap_connection_name: String,
    /// Fixed hotspot address
    pub ap_address: Ipv4Addr,
    /// Hotspot subnet prefix length
    pub ap_prefix: u8,
    /// Upper bound for any single external network command (seconds)
    pub command_timeout_secs: u64,

    // --- HTTP ---
    /// Control surface port on real hardware
    pub control_port: u16,
    /// Control surface port in emulator mode
    pub emulator_control_port: u16,
    /// Captive portal port (well-known low port for auto-detection)
    pub portal_port: u16,
    /// Delay between a successful connect response and releasing the portal (ms)
    pub connect_signal_delay_ms: u64,

    // --- Rendering ---
    /// Steady-state frame rate
    pub fps: u32,
    /// Frame rate while the setup screen is shown
    pub setup_fps: u32,
    /// Consecutive failed frames before falling back to another app
    pub frame_error_threshold: u32,
    /// App started when none is requested on the command line
    pub default_app: String,
    /// Matrix width in pixels
    pub width: usize,
    /// Matrix height in pixels
    pub height: usize,
    /// Panel brightness (0-100)
    pub brightness: u8,
    /// Sink the panel driver reads raw RGB frames from
    pub panel_device: PathBuf,
}

impl Default for PixieConfig {
    fn default() -> Self {
        Self {
            // Network
            wifi_interface: "wlan0".into(),
            ap_connection_name: "pixie-hotspot".into(),
            ap_address: Ipv4Addr::new(192, 168, 4, 1),
            ap_prefix: 24,
            command_timeout_secs: 30,

            // HTTP
            control_port: 5000,
            emulator_control_port: 5002,
            portal_port: 80,
            connect_signal_delay_ms: 3000,

            // Rendering
            fps: 30,
            setup_fps: 10,
            frame_error_threshold: 3,
            default_app: "clock".into(),
            width: 64,
            height: 64,
            brightness: 80,
            panel_device: PathBuf::from("/run/pixie/panel"),
        }
    }
}

impl PixieConfig {
    /// Load from `path`, or from `$PIXIE_CONFIG`, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        let Some(path) = path.map(Path::to_path_buf).or(from_env) else {
            log::info!("Config: no file given, using defaults");
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(&path)?;
        let config = Self::from_json(&text)?;
        log::info!("Config: loaded {}", path.display());
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the device unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wifi_interface.is_empty() {
            return Err(ConfigError::ValidationFailed("wifi_interface must not be empty"));
        }
        if self.ap_connection_name.is_empty() {
            return Err(ConfigError::ValidationFailed("ap_connection_name must not be empty"));
        }
        if self.ap_prefix == 0 || self.ap_prefix > 30 {
            return Err(ConfigError::ValidationFailed("ap_prefix must be 1-30"));
        }
        if self.command_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed("command_timeout_secs must be > 0"));
        }
        if !(1..=120).contains(&self.fps) || !(1..=120).contains(&self.setup_fps) {
            return Err(ConfigError::ValidationFailed("fps must be 1-120"));
        }
        if self.frame_error_threshold == 0 {
            return Err(ConfigError::ValidationFailed("frame_error_threshold must be > 0"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ValidationFailed("matrix dimensions must be non-zero"));
        }
        if self.brightness > 100 {
            return Err(ConfigError::ValidationFailed("brightness must be 0-100"));
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn connect_signal_delay(&self) -> Duration {
        Duration::from_millis(self.connect_signal_delay_ms)
    }

    pub fn control_port(&self, emulator: bool) -> u16 {
        if emulator { self.emulator_control_port } else { self.control_port }
    }
}
