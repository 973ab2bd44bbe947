//! Launching and stopping the server under test.
//!
//! # Design
//! `start_server` spawns the command with `PORT` in its environment and, when
//! a ready message is configured, blocks on the child's stdout for at most
//! `retry_count` lines. Readiness is best effort: a server that never prints
//! the marker is returned all the same, with `is_ready()` reporting `false`.
//!
//! The returned `ServerProcess` owns the child. It is terminated exactly once,
//! either by `stop_server` or when the handle is dropped, so an early return
//! between start and stop cannot leak the server.

use std::fmt;
use std::io::{self, BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{HarnessError, Result};

pub const DEFAULT_RETRY_COUNT: usize = 3;

/// Pause after the readiness marker, giving the server time to finish
/// whatever it does after logging.
pub const SETTLE_DELAY: Duration = Duration::from_millis(50);

/// What to run, and how to tell when it is up.
#[derive(Debug, Clone)]
pub struct ServerCommand {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    ready_message: Option<String>,
    retry_count: usize,
}

impl ServerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            ready_message: None,
            retry_count: DEFAULT_RETRY_COUNT,
        }
    }

    /// Run `line` through `sh -c`.
    pub fn shell(line: impl Into<String>) -> Self {
        Self::new("sh").arg("-c").arg(line)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add a variable on top of the inherited environment. `PORT` is always
    /// overwritten by the port passed to `start_server`.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Marker line to wait for. An empty message would match any line, so
    /// it is treated as no message at all.
    pub fn ready_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.ready_message = (!message.is_empty()).then_some(message);
        self
    }

    pub fn retry_count(mut self, count: usize) -> Self {
        self.retry_count = count;
        self
    }
}

impl fmt::Display for ServerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// A running server. Terminated on `stop_server` or drop, whichever is first.
#[derive(Debug)]
pub struct ServerProcess {
    child: Child,
    // Held open so the server never sees a closed pipe while it runs.
    stdout: Option<BufReader<ChildStdout>>,
    ready: bool,
    stopped: bool,
}

impl ServerProcess {
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Whether the ready message was seen before `start_server` returned.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    fn wait_for_ready(&mut self, message: &str, retry_count: usize) -> bool {
        let Some(stdout) = self.stdout.as_mut() else {
            return false;
        };
        let mut buf = Vec::new();
        for _ in 0..retry_count {
            buf.clear();
            match stdout.read_until(b'\n', &mut buf) {
                Ok(0) => {
                    debug!("server closed its output");
                    return false;
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(%err, "failed to read server output");
                    return false;
                }
            }
            let line = String::from_utf8_lossy(&buf);
            if line.contains(message) {
                thread::sleep(SETTLE_DELAY);
                return true;
            }
            info!("server: {}", line.trim_end());
        }
        false
    }

    fn terminate(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        if let Err(err) = send_terminate(&mut self.child) {
            warn!(pid = self.child.id(), %err, "failed to signal server");
        }
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        if !self.stopped {
            debug!(pid = self.child.id(), "server handle dropped, stopping server");
            self.terminate();
        }
    }
}

/// Spawn `command` with `PORT=port`, optionally waiting for its ready message.
pub fn start_server(command: &ServerCommand, port: u16) -> Result<ServerProcess> {
    info!(%command, port, "starting server");
    let cwd = std::env::current_dir().map_err(|e| HarnessError::io(".", e))?;

    let mut child = Command::new(&command.program)
        .args(&command.args)
        .envs(command.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .env("PORT", port.to_string())
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|source| HarnessError::ProcessLaunch {
            command: command.to_string(),
            source,
        })?;

    let stdout = child.stdout.take().map(BufReader::new);
    let mut process = ServerProcess {
        child,
        stdout,
        ready: false,
        stopped: false,
    };

    if let Some(message) = &command.ready_message {
        process.ready = process.wait_for_ready(message, command.retry_count);
        if !process.ready {
            warn!(
                ready_message = %message,
                retries = command.retry_count,
                "ready message not seen, continuing anyway"
            );
        }
    }
    Ok(process)
}

/// Ask the server to shut down. Does not wait for it to exit.
pub fn stop_server(mut process: ServerProcess) {
    info!(pid = process.id(), "stopping server");
    process.terminate();
}

#[cfg(unix)]
fn send_terminate(child: &mut Child) -> io::Result<()> {
    let pid = libc::pid_t::try_from(child.id())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    // SAFETY: kill(2) takes plain integers and touches no memory we own.
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn send_terminate(child: &mut Child) -> io::Result<()> {
    child.kill()
}
