/// Server process management for yaml2mcp.
///
/// This module owns the lifecycle of locally launched servers: spawning them,
/// observing their exits, stopping them gracefully (then forcefully), and
/// reporting a `stopped` / `running` / `error` status per server name.
/// Public operations are instrumented with `tracing` spans.
///
/// # Components
///
/// * `definition` - What to launch for a server
/// * `status` - Per-name status model
/// * `process` - The OS seam: spawning processes and delivering signals
/// * `manager` - The registry tying names, statuses and live processes together
///
/// # Examples
///
/// ```no_run
/// use yaml2mcp::server::{ProcessManager, ServerDefinition, ServerState};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> yaml2mcp::Result<()> {
///     let manager = ProcessManager::new();
///     let definition = ServerDefinition::new("filesystem", "npx")
///         .with_args(["-y", "@modelcontextprotocol/server-filesystem", "/tmp"]);
///
///     manager.start(
///         &definition,
///         Some(Arc::new(|name: &str| println!("{} exited", name))),
///     )?;
///     assert_eq!(
///         manager.status_of("filesystem").map(|s| s.state),
///         Some(ServerState::Running)
///     );
///
///     manager.stop("filesystem").await?;
///     Ok(())
/// }
/// ```
mod definition;
pub mod manager;
pub mod process;
mod status;

pub use definition::ServerDefinition;
pub use manager::{DEFAULT_STOP_TIMEOUT, ExitCallback, ProcessManager};
pub use process::{
    ExitOutcome, LaunchedProcess, ProcessLauncher, ProcessOutput, ProcessSignals, ServerId,
    SystemLauncher,
};
pub use status::{ServerState, ServerStatus};
