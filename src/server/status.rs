use serde::Serialize;
use std::fmt;

/// Lifecycle state of a named server.
///
/// `Stopped` and `Error` can both move back to `Running` through a new
/// start; no state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerState {
    /// No live process; the last exit (if any) was clean or requested
    Stopped,
    /// A live process is registered
    Running,
    /// The last spawn failed or the process died abnormally
    Error,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServerState::Stopped => "stopped",
            ServerState::Running => "running",
            ServerState::Error => "error",
        };
        f.write_str(label)
    }
}

/// Status of one known server, as reported by the manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerStatus {
    /// Server name
    pub name: String,
    /// Current state
    pub state: ServerState,
    /// Human-readable cause, present only in the `Error` state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl ServerStatus {
    pub(crate) fn stopped(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: ServerState::Stopped,
            error_detail: None,
        }
    }

    pub(crate) fn set(&mut self, state: ServerState) {
        self.state = state;
        self.error_detail = None;
    }

    pub(crate) fn set_error(&mut self, detail: String) {
        self.state = ServerState::Error;
        self.error_detail = Some(detail);
    }
}
