//! Application lifecycle, the render-side core.
//!
//! [`LifecycleManager`] owns the app registry, the single active app, the
//! display, and the per-frame failure counter.  It is driven one frame at a
//! time by [`LifecycleManager::step_frame`]; [`SharedLifecycle`] wraps it
//! in a mutex so the render thread and HTTP handlers serialise on it.
//!
//! ```text
//!  HTTP switch ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                  │   LifecycleManager     │
//!  render loop ──▶ │ registry · fallback    │ ──▶ DisplayPort
//!                  └────────────────────────┘
//! ```
//!
//! ## Failure handling
//!
//! A failed `update`/`draw` draws the diagnostic frame and bumps the
//! counter.  When the counter reaches the threshold the manager falls back
//! to the first other app (by name) that starts.  When none does, it stays
//! on the failing app with the counter reset, so fallback is attempted at
//! most once per `threshold` frames.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::error::LifecycleError;
use crate::task::Shutdown;

use super::events::AppEvent;
use super::ports::{Application, DisplayPort, EventSink};

/// Consecutive failed frames that trigger a fallback.
pub const DEFAULT_ERROR_THRESHOLD: u32 = 3;

// ───────────────────────────────────────────────────────────────
// Registry entry
// ───────────────────────────────────────────────────────────────

/// A registered app and whether it is the one currently running.
pub struct AppHandle {
    name: String,
    app: Box<dyn Application>,
    active: bool,
}

impl AppHandle {
    fn new(name: &str, app: Box<dyn Application>) -> Self {
        Self {
            name: name.to_string(),
            app,
            active: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Best-effort stop.  Failures are reported, never propagated.
    fn stop(&mut self, events: &dyn EventSink) {
        self.active = false;
        if let Err(e) = self.app.stop() {
            events.emit(&AppEvent::StopFailed {
                name: self.name.clone(),
                error: format!("{e:#}"),
            });
        }
    }
}

// ───────────────────────────────────────────────────────────────
// LifecycleManager
// ───────────────────────────────────────────────────────────────

pub struct LifecycleManager {
    display: Box<dyn DisplayPort>,
    apps: HashMap<String, AppHandle>,
    active: Option<String>,
    consecutive_errors: u32,
    error_threshold: u32,
    events: Arc<dyn EventSink>,
}

impl LifecycleManager {
    pub fn new(display: Box<dyn DisplayPort>, events: Arc<dyn EventSink>) -> Self {
        Self {
            display,
            apps: HashMap::new(),
            active: None,
            consecutive_errors: 0,
            error_threshold: DEFAULT_ERROR_THRESHOLD,
            events,
        }
    }

    /// Override the fallback threshold (clamped to at least 1).
    pub fn with_error_threshold(mut self, threshold: u32) -> Self {
        self.error_threshold = threshold.max(1);
        self
    }

    // ── Registry ──────────────────────────────────────────────

    /// Insert or replace the app registered under `name`.
    ///
    /// Replacing the active app stops the old instance and starts the new
    /// one in its place.
    pub fn register(
        &mut self,
        name: &str,
        app: Box<dyn Application>,
    ) -> Result<(), LifecycleError> {
        if name.trim().is_empty() {
            return Err(LifecycleError::InvalidApp("name must not be empty".into()));
        }

        let previous = self.apps.insert(name.to_string(), AppHandle::new(name, app));
        self.events.emit(&AppEvent::Registered { name: name.to_string() });

        if self.active.as_deref() == Some(name) {
            if let Some(mut old) = previous {
                old.stop(self.events.as_ref());
            }
            self.consecutive_errors = 0;
            self.start_active();
        }
        Ok(())
    }

    /// Make `name` the active app.
    ///
    /// Unknown names are rejected without touching any state.  The display
    /// is always cleared on success.
    pub fn switch_to(&mut self, name: &str) -> Result<(), LifecycleError> {
        if !self.apps.contains_key(name) {
            self.events.emit(&AppEvent::SwitchRejected { name: name.to_string() });
            return Err(LifecycleError::UnknownApp(name.to_string()));
        }

        let from = self.active.take();
        if let Some(handle) = from.as_deref().and_then(|prev| self.apps.get_mut(prev)) {
            handle.stop(self.events.as_ref());
        }

        self.active = Some(name.to_string());
        self.consecutive_errors = 0;
        self.events.emit(&AppEvent::Switched {
            from,
            to: name.to_string(),
        });
        self.start_active();

        self.display.clear();
        Ok(())
    }

    // ── Frame ─────────────────────────────────────────────────

    /// Render one frame: clear, `update`, `draw`, refresh.
    ///
    /// Does nothing when no app is active.
    pub fn step_frame(&mut self) {
        let Some(name) = self.active.clone() else {
            return;
        };
        let Some(handle) = self.apps.get_mut(&name) else {
            return;
        };

        self.display.clear();
        let display = self.display.as_mut();
        let result = handle.app.update().and_then(|()| handle.app.draw(display));

        match result {
            Ok(()) => {
                if self.consecutive_errors > 0 {
                    self.events.emit(&AppEvent::Recovered {
                        name,
                        after: self.consecutive_errors,
                    });
                    self.consecutive_errors = 0;
                }
            }
            Err(e) => {
                self.consecutive_errors += 1;
                let error = format!("{e:#}");
                self.events.emit(&AppEvent::FrameFailed {
                    name: name.clone(),
                    consecutive: self.consecutive_errors,
                    error: error.clone(),
                });

                self.display.clear();
                if let Err(draw_err) = handle.app.draw_error(self.display.as_mut(), &error) {
                    warn!("FRAME: '{}' could not draw its error frame: {:#}", name, draw_err);
                    crate::diagnostics::draw_error_frame(self.display.as_mut());
                }

                if self.consecutive_errors >= self.error_threshold {
                    self.fallback();
                }
            }
        }

        if let Err(e) = self.display.refresh() {
            warn!("FRAME: {}", e);
        }
    }

    /// Render the fixed diagnostic frame and push it out.
    pub fn draw_error_frame(&mut self) {
        crate::diagnostics::draw_error_frame(self.display.as_mut());
        if let Err(e) = self.display.refresh() {
            warn!("FRAME: {}", e);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn current_app(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Registered names, sorted.
    pub fn available_apps(&self) -> Vec<String> {
        let mut names: Vec<String> = self.apps.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.apps.get(name).is_some_and(AppHandle::is_active)
    }

    /// Stop the active app, if any.  Used on orderly shutdown.
    pub fn stop_active(&mut self) {
        if let Some(handle) = self.active.take().and_then(|name| self.apps.get_mut(&name)) {
            info!("APP: stopping '{}'", handle.name());
            handle.stop(self.events.as_ref());
        }
    }

    /// Tear the manager down and hand the display back.
    pub fn into_display(mut self) -> Box<dyn DisplayPort> {
        self.stop_active();
        self.display
    }

    // ── Internal ──────────────────────────────────────────────

    /// Start whatever `active` names; fall back if it refuses.
    fn start_active(&mut self) {
        let Some(handle) = self.active.as_deref().and_then(|name| self.apps.get_mut(name)) else {
            return;
        };
        handle.active = true;
        if let Err(e) = handle.app.start() {
            self.events.emit(&AppEvent::StartFailed {
                name: handle.name.clone(),
                error: format!("{e:#}"),
            });
            self.fallback();
        }
    }

    /// Move to the first other app (by name) that starts.
    fn fallback(&mut self) {
        let Some(failed) = self.active.clone() else {
            return;
        };

        let mut candidates: Vec<String> = self
            .apps
            .keys()
            .filter(|name| **name != failed)
            .cloned()
            .collect();
        candidates.sort();

        for candidate in candidates {
            let Some(handle) = self.apps.get_mut(&candidate) else {
                continue;
            };
            match handle.app.start() {
                Ok(()) => {
                    handle.active = true;
                    if let Some(old) = self.apps.get_mut(&failed) {
                        old.stop(self.events.as_ref());
                    }
                    self.active = Some(candidate.clone());
                    self.consecutive_errors = 0;
                    self.events.emit(&AppEvent::FallbackEngaged {
                        from: failed,
                        to: candidate,
                    });
                    return;
                }
                Err(e) => {
                    self.events.emit(&AppEvent::StartFailed {
                        name: candidate,
                        error: format!("{e:#}"),
                    });
                }
            }
        }

        // Nothing else would start: stay put, retry after another `threshold` frames.
        self.consecutive_errors = 0;
        self.events.emit(&AppEvent::FallbackExhausted { name: failed });
    }
}

// ───────────────────────────────────────────────────────────────
// Shared handle
// ───────────────────────────────────────────────────────────────

/// Frame period for `fps` (at least one frame per second).
pub fn frame_budget(fps: u32) -> Duration {
    Duration::from_secs(1) / fps.max(1)
}

/// The lifecycle manager behind a mutex, shared between the render thread
/// and the HTTP handlers.  A frame and a switch never interleave.
#[derive(Clone)]
pub struct SharedLifecycle(Arc<Mutex<LifecycleManager>>);

impl SharedLifecycle {
    pub fn new(manager: LifecycleManager) -> Self {
        Self(Arc::new(Mutex::new(manager)))
    }

    /// Lock the manager.  A panic inside an app must not take the control
    /// surface down with it, so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, LifecycleManager> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current_app(&self) -> Option<String> {
        self.lock().current_app().map(str::to_owned)
    }

    pub fn available_apps(&self) -> Vec<String> {
        self.lock().available_apps()
    }

    pub fn switch_to(&self, name: &str) -> Result<(), LifecycleError> {
        self.lock().switch_to(name)
    }

    /// Render at `fps` until `shutdown` is requested.
    ///
    /// Each iteration sleeps for whatever is left of the frame budget after
    /// update + draw + refresh.  Slow frames delay the next one; none are
    /// skipped.
    pub fn run_loop(&self, fps: u32, shutdown: &Shutdown) -> Result<(), LifecycleError> {
        if self.lock().current_app().is_none() {
            warn!("APP: run loop requested with no active app");
            return Err(LifecycleError::NoActiveApp);
        }

        let budget = frame_budget(fps);
        info!("APP: render loop at {} fps", fps);
        while !shutdown.is_requested() {
            let started = Instant::now();
            self.lock().step_frame();
            std::thread::sleep(budget.saturating_sub(started.elapsed()));
        }
        info!("APP: render loop stopped");
        Ok(())
    }

    /// Recover the manager once every other handle has been dropped.
    pub fn try_into_inner(self) -> Result<LifecycleManager, Self> {
        Arc::try_unwrap(self.0)
            .map(|m| m.into_inner().unwrap_or_else(PoisonError::into_inner))
            .map_err(Self)
    }
}
