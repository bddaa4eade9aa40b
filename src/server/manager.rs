use crate::error::{Error, Result};
use crate::server::process::{ExitOutcome, LaunchedProcess, ProcessOutput, ProcessSignals};
use crate::server::{
    ProcessLauncher, ServerDefinition, ServerId, ServerState, ServerStatus, SystemLauncher,
};
use futures::future::join_all;
use futures_lite::io::{AsyncBufReadExt, BufReader};
use futures_lite::StreamExt;
use std::collections::BTreeSet;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;

/// Default bound on the graceful phase of a stop.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

const STDERR_TAIL_LIMIT: usize = 64 * 1024;

/// Callback invoked with the server name after a process exit has been
/// recorded.
pub type ExitCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Bounded buffer holding the most recent stderr output of a server.
#[derive(Debug, Default)]
struct StderrTail {
    text: String,
}

impl StderrTail {
    fn push_line(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
        if self.text.len() > STDERR_TAIL_LIMIT {
            let mut cut = self.text.len() - STDERR_TAIL_LIMIT;
            while !self.text.is_char_boundary(cut) {
                cut += 1;
            }
            self.text.drain(..cut);
        }
    }
}

/// The manager's exclusive reference to a running process.
struct LiveProcess {
    id: ServerId,
    signals: Arc<dyn ProcessSignals>,
    stop_requested: bool,
    exited: watch::Receiver<bool>,
}

struct Entry {
    status: ServerStatus,
    live: Option<LiveProcess>,
    stderr: Arc<Mutex<StderrTail>>,
}

impl Entry {
    fn new(name: &str) -> Self {
        Self {
            status: ServerStatus::stopped(name),
            live: None,
            stderr: Arc::new(Mutex::new(StderrTail::default())),
        }
    }

    fn attach(&mut self, live: LiveProcess) {
        self.live = Some(live);
        self.status.set(ServerState::Running);
    }
}

/// Name-keyed table of statuses and live handles, in first-seen order.
#[derive(Default)]
struct Registry {
    entries: Vec<Entry>,
}

impl Registry {
    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.status.name == name)
    }

    fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.status.name == name)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.status.name == name)
    }

    fn get_or_insert(&mut self, name: &str) -> &mut Entry {
        let index = match self.position(name) {
            Some(index) => index,
            None => {
                self.entries.push(Entry::new(name));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index]
    }

    /// Entry whose live handle is the process `id`, if it is still current.
    fn live_mut(&mut self, name: &str, id: ServerId) -> Option<&mut Entry> {
        self.get_mut(name)
            .filter(|e| e.live.as_ref().is_some_and(|live| live.id == id))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Nothing panics while a registry guard is held, so poisoning carries no
    // half-applied state.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Starts, stops and tracks named server processes.
///
/// Every known name has a [`ServerStatus`]; a name has a live process handle
/// exactly when its state is [`ServerState::Running`]. All transitions for a
/// name happen under one registry lock, which is never held across an await,
/// so operations on different names never wait on each other.
///
/// `start` spawns a background observer per process and therefore must be
/// called from within a Tokio runtime.
///
/// # Examples
///
/// ```no_run
/// use yaml2mcp::server::{ProcessManager, ServerDefinition};
///
/// #[tokio::main]
/// async fn main() -> yaml2mcp::Result<()> {
///     let manager = ProcessManager::new();
///     let definition = ServerDefinition::new("fetch", "uvx").with_args(["mcp-server-fetch"]);
///
///     manager.seed(&definition);
///     manager.start(&definition, None)?;
///     assert!(manager.is_running("fetch"));
///
///     manager.stop_all().await?;
///     Ok(())
/// }
/// ```
pub struct ProcessManager {
    registry: Arc<Mutex<Registry>>,
    launcher: Arc<dyn ProcessLauncher>,
    stop_timeout: Duration,
}

impl ProcessManager {
    /// Create a manager that launches real processes.
    pub fn new() -> Self {
        Self::with_launcher(Arc::new(SystemLauncher))
    }

    /// Create a manager using a custom spawn primitive.
    pub fn with_launcher(launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            launcher,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }

    /// Set how long `stop` waits after the graceful signal before killing.
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Graceful-phase timeout used by `stop`.
    pub fn stop_timeout(&self) -> Duration {
        self.stop_timeout
    }

    /// Register a name as `stopped` unless it is already known.
    ///
    /// Existing entries are never touched, so repeated reconciliation passes
    /// keep `running` and `error` states intact.
    pub fn seed(&self, definition: &ServerDefinition) {
        let mut registry = lock(&self.registry);
        if registry.position(&definition.name).is_none() {
            tracing::debug!(server = %definition.name, "Seeding server status");
            registry.entries.push(Entry::new(&definition.name));
        }
    }

    /// Spawn the server and register its live handle.
    ///
    /// Returns as soon as the spawn is accepted; termination is observed in
    /// the background. `on_exit` runs once, after the exit has been recorded,
    /// whatever the cause of the exit.
    ///
    /// # Errors
    ///
    /// * [`Error::AlreadyRunning`] if a live process exists for the name; the
    ///   existing handle and status are left alone.
    /// * [`Error::SpawnFailed`] if the OS refused the spawn; the status
    ///   becomes `error` and no handle is registered.
    #[tracing::instrument(skip(self, definition, on_exit), fields(server = %definition.name))]
    pub fn start(
        &self,
        definition: &ServerDefinition,
        on_exit: Option<ExitCallback>,
    ) -> Result<ServerId> {
        let name = definition.name.as_str();
        let mut registry = lock(&self.registry);
        let entry = registry.get_or_insert(name);

        if entry.live.is_some() {
            tracing::debug!("Server already running");
            return Err(Error::AlreadyRunning(name.to_string()));
        }

        tracing::info!(command = %definition.command, "Starting server process");
        let launched = match self.launcher.launch(definition) {
            Ok(launched) => launched,
            Err(e) => {
                tracing::error!(error = %e, "Failed to spawn server process");
                entry.status.set_error(e.to_string());
                return Err(Error::SpawnFailed {
                    name: name.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let LaunchedProcess {
            pid,
            signals,
            exit,
            stdout,
            stderr,
        } = launched;

        let id = ServerId::new();
        let (exited_tx, exited_rx) = watch::channel(false);

        entry.stderr = Arc::new(Mutex::new(StderrTail::default()));
        if let Some(stderr) = stderr {
            tokio::spawn(capture_stderr(
                name.to_string(),
                stderr,
                Arc::clone(&entry.stderr),
            ));
        }
        if let Some(stdout) = stdout {
            tokio::spawn(async move {
                let mut sink = futures_lite::io::sink();
                let _ = futures_lite::io::copy(stdout, &mut sink).await;
            });
        }

        entry.attach(LiveProcess {
            id,
            signals,
            stop_requested: false,
            exited: exited_rx,
        });

        let registry_handle = Arc::clone(&self.registry);
        let observed_name = name.to_string();
        tokio::spawn(async move {
            let outcome = exit.await;
            let recorded = observe_exit(&registry_handle, &observed_name, id, outcome);
            let _ = exited_tx.send_replace(true);
            if let (true, Some(on_exit)) = (recorded, on_exit) {
                on_exit(&observed_name);
            }
        });

        tracing::info!(server_id = %id, pid = ?pid, "Server started");
        Ok(id)
    }

    /// Stop the server and wait until its exit has been recorded.
    ///
    /// Sends the graceful signal, waits up to the stop timeout, then sends
    /// the forceful signal and waits for the exit. Stopping a server with no
    /// live process marks it `stopped` and succeeds.
    ///
    /// # Errors
    ///
    /// [`Error::StopFailed`] if a signal could not be delivered. The live
    /// handle stays registered so the stop can be retried.
    #[tracing::instrument(skip(self), fields(server = %name))]
    pub async fn stop(&self, name: &str) -> Result<()> {
        let (id, signals, mut exited) = {
            let mut registry = lock(&self.registry);
            let Some(entry) = registry.get_mut(name) else {
                tracing::debug!("Stop requested for unknown server");
                return Ok(());
            };
            let Some(live) = entry.live.as_mut() else {
                tracing::debug!("Server not running, nothing to stop");
                entry.status.set(ServerState::Stopped);
                return Ok(());
            };
            live.stop_requested = true;
            (live.id, Arc::clone(&live.signals), live.exited.clone())
        };

        tracing::info!(server_id = %id, "Sending graceful termination");
        if let Err(e) = signals.terminate() {
            tracing::error!(error = %e, "Failed to deliver graceful termination");
            self.withdraw_stop_request(name, id);
            return Err(stop_failed(name, e));
        }

        if tokio::time::timeout(self.stop_timeout, wait_exited(&mut exited))
            .await
            .is_err()
            && !*exited.borrow()
        {
            tracing::warn!(
                timeout_ms = self.stop_timeout.as_millis() as u64,
                "Server ignored graceful termination, killing"
            );
            if let Err(e) = signals.kill() {
                tracing::error!(error = %e, "Failed to deliver forceful termination");
                self.withdraw_stop_request(name, id);
                return Err(stop_failed(name, e));
            }
            wait_exited(&mut exited).await;
        }

        tracing::info!("Server stopped");
        Ok(())
    }

    /// Clear the stop flag of process `id` after a failed stop, so a later
    /// unsolicited exit is judged on its own outcome.
    fn withdraw_stop_request(&self, name: &str, id: ServerId) {
        if let Some(live) = lock(&self.registry)
            .live_mut(name, id)
            .and_then(|entry| entry.live.as_mut())
        {
            live.stop_requested = false;
        }
    }

    /// Stop the server if needed, then forget it entirely.
    ///
    /// Removing an unknown name is a no-op. The entry is only deleted once no
    /// live handle is registered, so a start racing the removal is stopped
    /// too rather than left orphaned.
    #[tracing::instrument(skip(self), fields(server = %name))]
    pub async fn remove(&self, name: &str) -> Result<()> {
        loop {
            {
                let mut registry = lock(&self.registry);
                match registry.position(name) {
                    None => return Ok(()),
                    Some(index) if registry.entries[index].live.is_none() => {
                        registry.entries.remove(index);
                        tracing::info!("Server removed");
                        return Ok(());
                    }
                    Some(_) => {}
                }
            }
            self.stop(name).await?;
        }
    }

    /// Stop every running server concurrently.
    ///
    /// Each stop runs its own graceful/forceful sequence. All of them are
    /// awaited even when some fail; failures are returned together.
    #[tracing::instrument(skip(self))]
    pub async fn stop_all(&self) -> Result<()> {
        let names = self.running_names();
        tracing::info!(count = names.len(), "Stopping all running servers");

        let results = join_all(names.iter().map(|name| self.stop(name))).await;
        let errors: Vec<Error> = results.into_iter().filter_map(|r| r.err()).collect();

        if errors.is_empty() {
            tracing::info!("All servers stopped");
            Ok(())
        } else {
            tracing::warn!(error_count = errors.len(), "Some servers failed to stop");
            Err(Error::StopAll(errors))
        }
    }

    /// Current status of a server, or `None` if the name is unknown.
    pub fn status_of(&self, name: &str) -> Option<ServerStatus> {
        lock(&self.registry).get(name).map(|e| e.status.clone())
    }

    /// Every known status, in the order names were first seen.
    pub fn all_statuses(&self) -> Vec<ServerStatus> {
        lock(&self.registry)
            .entries
            .iter()
            .map(|e| e.status.clone())
            .collect()
    }

    /// Whether a live process is registered for the name.
    pub fn is_running(&self, name: &str) -> bool {
        lock(&self.registry)
            .get(name)
            .is_some_and(|e| e.live.is_some())
    }

    /// Names with a live process.
    pub fn running_names(&self) -> BTreeSet<String> {
        lock(&self.registry)
            .entries
            .iter()
            .filter(|e| e.live.is_some())
            .map(|e| e.status.name.clone())
            .collect()
    }

    /// Most recent stderr output of the server's latest process.
    pub fn stderr_of(&self, name: &str) -> Option<String> {
        let stderr = lock(&self.registry).get(name).map(|e| Arc::clone(&e.stderr))?;
        let text = lock(&stderr).text.clone();
        Some(text)
    }
}

impl Default for ProcessManager {
    fn default() -> Self {
        Self::new()
    }
}

fn stop_failed(name: &str, e: io::Error) -> Error {
    Error::StopFailed {
        name: name.to_string(),
        reason: e.to_string(),
    }
}

async fn wait_exited(exited: &mut watch::Receiver<bool>) {
    // A dropped sender means the observer is gone, which only happens after
    // it has finished its bookkeeping.
    let _ = exited.wait_for(|done| *done).await;
}

/// Exit bookkeeping for process `id`: deregister the handle and record the
/// outcome. Returns false if the handle was no longer current.
fn observe_exit(
    registry: &Mutex<Registry>,
    name: &str,
    id: ServerId,
    outcome: io::Result<ExitOutcome>,
) -> bool {
    let stderr = {
        let mut registry = lock(registry);
        let Some(entry) = registry.live_mut(name, id) else {
            return false;
        };
        let stop_requested = entry.live.take().is_some_and(|live| live.stop_requested);

        match outcome {
            Err(e) => {
                tracing::error!(server = %name, server_id = %id, error = %e, "Lost track of server process");
                entry.status.set_error(e.to_string());
                None
            }
            Ok(_) if stop_requested => {
                tracing::info!(server = %name, server_id = %id, "Server exited after stop request");
                entry.status.set(ServerState::Stopped);
                None
            }
            Ok(ExitOutcome::Code(0)) => {
                tracing::info!(server = %name, server_id = %id, "Server exited cleanly");
                entry.status.set(ServerState::Stopped);
                None
            }
            Ok(outcome) => {
                entry.status.set_error(outcome.to_string());
                Some((outcome, Arc::clone(&entry.stderr)))
            }
        }
    };

    if let Some((outcome, stderr)) = stderr {
        let tail = lock(&stderr).text.clone();
        tracing::warn!(
            server = %name,
            server_id = %id,
            exit = %outcome,
            stderr = %tail.trim_end(),
            "Server exited unexpectedly"
        );
    }

    true
}

async fn capture_stderr(name: String, stderr: ProcessOutput, tail: Arc<Mutex<StderrTail>>) {
    let mut lines = BufReader::new(stderr).lines();
    while let Some(Ok(line)) = lines.next().await {
        tracing::debug!(server = %name, "stderr: {}", line);
        lock(&tail).push_line(&line);
    }
}
