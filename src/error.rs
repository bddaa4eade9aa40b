/// Error handling module for yaml2mcp.
///
/// This module defines the error types used throughout the library.
/// Process lifecycle failures carry the name of the server they concern,
/// so a caller juggling many servers can tell which one went wrong.
///
/// # Example
///
/// ```
/// use yaml2mcp::error::{Error, Result};
///
/// fn handle_error(result: Result<()>) {
///     match result {
///         Ok(_) => println!("Operation succeeded"),
///         Err(Error::AlreadyRunning(name)) => println!("Server '{}' is already running", name),
///         Err(Error::SpawnFailed { name, reason }) => println!("Could not start '{}': {}", name, reason),
///         Err(e) => println!("Other error: {}", e),
///     }
/// }
/// ```
use thiserror::Error;

/// Errors that can occur in the yaml2mcp library.
///
/// An abnormal process exit is deliberately absent here: a crash is not the
/// answer to any call, it is recorded as an `error` status with a detail
/// naming the exit code or signal.
#[derive(Error, Debug)]
pub enum Error {
    /// A live process is already registered under this name.
    ///
    /// This error occurs when:
    /// - `start` is called twice for the same server without a stop in between
    #[error("Server {0} is already running")]
    AlreadyRunning(String),

    /// The operating system refused to launch the server.
    ///
    /// This error occurs when:
    /// - The executable does not exist or is not on `PATH`
    /// - The executable is not executable (permission denied)
    /// - The working directory does not exist
    #[error("Failed to start server {name}: {reason}")]
    SpawnFailed {
        /// Server name
        name: String,
        /// OS-level cause
        reason: String,
    },

    /// A termination signal could not be delivered.
    ///
    /// The live handle stays registered so the stop can be retried.
    #[error("Failed to stop server {name}: {reason}")]
    StopFailed {
        /// Server name
        name: String,
        /// OS-level cause
        reason: String,
    },

    /// One or more servers failed to stop during a bulk stop.
    ///
    /// Every individual failure is kept; none of them prevented the others
    /// from being stopped.
    #[error("{} server(s) failed to stop: {}", .0.len(), join_errors(.0))]
    StopAll(Vec<Error>),

    /// Requested server is not present in the inventory.
    #[error("Server {0} not found in configuration")]
    ServerNotFound(String),

    /// Failed to parse configuration from a file or string.
    ///
    /// This error occurs when:
    /// - The YAML or JSON is malformed
    /// - The `servers` sequence is missing
    /// - Field types are incorrect
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Configuration parsed but contains invalid values.
    ///
    /// This error occurs when:
    /// - A server has an empty name or command
    /// - Two servers share a name
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// A configuration or artifact file could not be written.
    #[error("Failed to write configuration: {0}")]
    ConfigWrite(String),

    /// Any other error not covered by the above categories.
    #[error("Other error: {0}")]
    Other(String),
}

fn join_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for yaml2mcp operations.
///
/// This is a convenience type alias for `std::result::Result` with the `Error` type
/// from this module.
pub type Result<T> = std::result::Result<T, Error>;
