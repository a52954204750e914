//! Named worker threads and cooperative shutdown.
//!
//! The render loop runs on its own OS thread so that HTTP handlers on the
//! tokio runtime never share a scheduler with frame pacing.  Threads are
//! spawned with an explicit name and stack size; the name shows up in
//! panic messages and `top -H`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

/// Process-wide stop request, shared by the render loop and the listeners.
#[derive(Debug, Clone, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Spawn a named thread with an explicit stack size.
pub fn spawn_named<T: Send + 'static>(
    name: &str,
    stack_kb: usize,
    f: impl FnOnce() -> T + Send + 'static,
) -> std::io::Result<JoinHandle<T>> {
    log::info!("Spawning '{}' (stack={}KB)", name, stack_kb);
    std::thread::Builder::new()
        .name(name.into())
        .stack_size(stack_kb * 1024)
        .spawn(f)
}
