// src/server/process.rs
use crate::server::ServerDefinition;
use async_process::{Child, Command, Stdio};
use futures::future::BoxFuture;
use futures_lite::AsyncRead;
use std::fmt;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// Unique identifier for one launched process instance.
///
/// A server that is stopped and started again gets a fresh id, which lets
/// the manager tell a stale exit notification from a current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServerId(Uuid);

impl ServerId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a process terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Exited on its own with this code
    Code(i32),
    /// Killed by this signal number
    Signal(i32),
    /// The platform reported neither a code nor a signal
    Unknown,
}

impl From<std::process::ExitStatus> for ExitOutcome {
    fn from(status: std::process::ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitOutcome::Code(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitOutcome::Signal(signal);
            }
        }
        ExitOutcome::Unknown
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Code(code) => write!(f, "Process exited with code {}", code),
            ExitOutcome::Signal(signal) => write!(f, "Process terminated by signal {}", signal),
            ExitOutcome::Unknown => f.write_str("Process exited with unknown status"),
        }
    }
}

/// Signal delivery for one process.
///
/// Both methods treat a process that is already gone as success.
pub trait ProcessSignals: Send + Sync {
    /// Politely ask the process to exit (SIGTERM on Unix).
    fn terminate(&self) -> io::Result<()>;

    /// Unconditionally kill the process (SIGKILL on Unix).
    fn kill(&self) -> io::Result<()>;
}

/// Boxed output pipe of a launched process.
pub type ProcessOutput = Pin<Box<dyn AsyncRead + Send>>;

/// Everything the manager needs from a freshly spawned process.
pub struct LaunchedProcess {
    /// OS process id, if the platform exposes one
    pub pid: Option<u32>,
    /// Signal delivery handle, usable while `exit` is being awaited
    pub signals: Arc<dyn ProcessSignals>,
    /// Resolves exactly once when the process terminates. An `Err` is an
    /// OS-level failure while waiting, not an exit.
    pub exit: BoxFuture<'static, io::Result<ExitOutcome>>,
    /// Standard output, drained by the manager
    pub stdout: Option<ProcessOutput>,
    /// Standard error, buffered by the manager for diagnostics
    pub stderr: Option<ProcessOutput>,
}

/// Process spawn primitive.
///
/// `launch` must not block beyond the spawn itself: it is called while the
/// manager holds its registry lock.
pub trait ProcessLauncher: Send + Sync {
    /// Spawn the process described by `definition`.
    fn launch(&self, definition: &ServerDefinition) -> io::Result<LaunchedProcess>;
}

/// Launches real OS processes through `async-process`.
///
/// No shell is involved: `command` is executed directly with `args`. The
/// inherited environment is extended with `env`, overrides winning. Stdin is
/// piped and held open until the process exits, since stdio MCP servers quit
/// on end of input.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn launch(&self, definition: &ServerDefinition) -> io::Result<LaunchedProcess> {
        let mut command = Command::new(&definition.command);
        command.args(&definition.args);
        command.envs(&definition.env);

        if let Some(dir) = definition.resolved_working_directory()? {
            command.current_dir(dir);
        }

        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn()?;
        let signals = PidSignals::new(child.id());
        let reaped = Arc::clone(&signals.reaped);

        let stdout = child
            .stdout
            .take()
            .map(|pipe| Box::pin(pipe) as ProcessOutput);
        let stderr = child
            .stderr
            .take()
            .map(|pipe| Box::pin(pipe) as ProcessOutput);

        Ok(LaunchedProcess {
            pid: Some(signals.pid),
            signals: Arc::new(signals),
            exit: Box::pin(wait_for_exit(child, reaped)),
            stdout,
            stderr,
        })
    }
}

async fn wait_for_exit(mut child: Child, reaped: Arc<AtomicBool>) -> io::Result<ExitOutcome> {
    let _stdin = child.stdin.take();
    let status = child.status().await;
    reaped.store(true, Ordering::SeqCst);
    Ok(ExitOutcome::from(status?))
}

/// Delivers signals by process id.
///
/// Once the child has been reaped its pid may be reused, so signals are
/// dropped from then on.
#[derive(Debug)]
struct PidSignals {
    pid: u32,
    reaped: Arc<AtomicBool>,
}

impl PidSignals {
    fn new(pid: u32) -> Self {
        Self {
            pid,
            reaped: Arc::new(AtomicBool::new(false)),
        }
    }

    fn is_reaped(&self) -> bool {
        self.reaped.load(Ordering::SeqCst)
    }
}

#[cfg(unix)]
impl PidSignals {
    fn send(&self, signal: nix::sys::signal::Signal) -> io::Result<()> {
        use nix::errno::Errno;
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        if self.is_reaped() {
            return Ok(());
        }
        let pid = i32::try_from(self.pid)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
        match kill(Pid::from_raw(pid), signal) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(errno) => Err(io::Error::from(errno)),
        }
    }
}

#[cfg(unix)]
impl ProcessSignals for PidSignals {
    fn terminate(&self) -> io::Result<()> {
        self.send(nix::sys::signal::Signal::SIGTERM)
    }

    fn kill(&self) -> io::Result<()> {
        self.send(nix::sys::signal::Signal::SIGKILL)
    }
}

#[cfg(not(unix))]
impl PidSignals {
    fn taskkill(&self, force: bool) -> io::Result<()> {
        if self.is_reaped() {
            return Ok(());
        }
        let mut command = std::process::Command::new("taskkill");
        command.arg("/T").arg("/PID").arg(self.pid.to_string());
        if force {
            command.arg("/F");
        }
        let status = command
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()?;
        taskkill_result(status.code())
    }
}

/// Map a taskkill exit code to a delivery result. Code 128 means the
/// process no longer exists.
#[cfg(any(not(unix), test))]
fn taskkill_result(code: Option<i32>) -> io::Result<()> {
    match code {
        Some(0) | Some(128) => Ok(()),
        Some(code) => Err(io::Error::other(format!(
            "taskkill exited with code {}",
            code
        ))),
        None => Err(io::Error::other("taskkill terminated without an exit code")),
    }
}

#[cfg(not(unix))]
impl ProcessSignals for PidSignals {
    fn terminate(&self) -> io::Result<()> {
        self.taskkill(false)
    }

    fn kill(&self) -> io::Result<()> {
        self.taskkill(true)
    }
}
