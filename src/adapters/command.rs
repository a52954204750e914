//! Host command runner with a hard deadline.
//!
//! Implements [`CommandRunner`] on top of `std::process`.  Output pipes are
//! drained on helper threads so a chatty child cannot fill a pipe and stall;
//! the parent polls for exit and kills the child once the deadline passes.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::app::ports::{CommandOutput, CommandRunner};
use crate::error::CommandError;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

fn drain(mut pipe: impl Read + Send + 'static) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

impl CommandRunner for SystemCommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError> {
        debug!("exec: {} {}", program, args.join(" "));

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CommandError::Spawn(format!("{program}: {e}")))?;

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    warn!("exec: '{}' exceeded {:?}, killing", program, timeout);
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(CommandError::TimedOut);
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(CommandError::Spawn(format!("{program}: {e}"))),
            }
        };

        Ok(CommandOutput {
            status: status.code(),
            stdout: collect(stdout),
            stderr: collect(stderr),
        })
    }
}
