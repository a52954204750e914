//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ LifecycleManager / ProvisioningManager (domain)
//! ```
//!
//! Driven adapters (panel, frame buffer, `nmcli`, log sink) implement these
//! traits.  The domain core holds them as trait objects, so it never touches
//! hardware or spawns processes directly.

use std::time::Duration;

use crate::error::{CommandError, DisplayError};

use super::events::AppEvent;

/// Colour as (R, G, B), each 0–255.
pub type Rgb = (u8, u8, u8);

pub const BLACK: Rgb = (0, 0, 0);

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → pixels)
// ───────────────────────────────────────────────────────────────

/// Pixel-matrix output.  Exactly one instance exists per process.
///
/// Coordinates outside `width() × height()` are silently ignored so apps
/// can draw shapes that run off the edge.
pub trait DisplayPort: Send {
    fn width(&self) -> usize;

    fn height(&self) -> usize;

    fn set_pixel(&mut self, x: i32, y: i32, colour: Rgb);

    fn fill(&mut self, colour: Rgb);

    fn clear(&mut self) {
        self.fill(BLACK);
    }

    /// Push the composed frame to the panel or to remote viewers.
    fn refresh(&mut self) -> Result<(), DisplayError>;

    /// Set output brightness (0–100).
    fn set_brightness(&mut self, percent: u8);
}

// ───────────────────────────────────────────────────────────────
// Application port (plug-in: lifecycle manager → app)
// ───────────────────────────────────────────────────────────────

/// A swappable full-screen app.
///
/// Apps keep their own state; the display is lent to them for each draw
/// call rather than stored.  Every callback may fail; the
/// [`LifecycleManager`](super::lifecycle::LifecycleManager) decides how to
/// recover.
pub trait Application: Send {
    /// Called when the app becomes active.
    fn start(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called when the app stops being active.
    fn stop(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Advance app logic by one frame.
    fn update(&mut self) -> anyhow::Result<()>;

    /// Render the current frame.  The display has already been cleared.
    fn draw(&mut self, display: &mut dyn DisplayPort) -> anyhow::Result<()>;

    /// Render an error indicator after a failed frame.
    fn draw_error(&mut self, display: &mut dyn DisplayPort, _message: &str) -> anyhow::Result<()> {
        crate::diagnostics::draw_error_frame(display);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Command runner port (driven adapter: domain → host OS)
// ───────────────────────────────────────────────────────────────

/// Captured result of an external program that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs external programs (`nmcli`, `iptables`) with a hard deadline.
///
/// Arguments are passed as a vector, never through a shell, so SSIDs
/// and passwords are not subject to quoting.
pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.  It is
/// handed to each component at construction instead of reaching for a
/// process-wide logger.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &AppEvent);
}
