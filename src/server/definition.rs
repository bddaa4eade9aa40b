use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

/// Static description of a server process to manage.
///
/// The `name` is the only identity key: two definitions with the same name
/// describe the same logical server.
///
/// # Examples
///
/// ```
/// use yaml2mcp::server::ServerDefinition;
/// use std::collections::BTreeMap;
///
/// let mut env = BTreeMap::new();
/// env.insert("NODE_ENV".to_string(), "production".to_string());
///
/// let definition = ServerDefinition {
///     name: "fetch".to_string(),
///     command: "node".to_string(),
///     args: vec!["server.js".to_string()],
///     env,
///     working_directory: Some("./servers/fetch".into()),
/// };
/// assert_eq!(definition.name, "fetch");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDefinition {
    /// Unique server name.
    pub name: String,

    /// Executable to launch. Never interpreted by a shell.
    pub command: String,

    /// Command-line arguments, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Environment overrides, merged on top of the inherited environment.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Working directory for the process.
    #[serde(default, rename = "cwd", skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<PathBuf>,
}

impl ServerDefinition {
    /// Create a definition with no arguments, environment or working directory.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            working_directory: None,
        }
    }

    /// Builder-style helper to set the arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Working directory made absolute against the current directory.
    pub fn resolved_working_directory(&self) -> io::Result<Option<PathBuf>> {
        self.working_directory
            .as_deref()
            .map(std::path::absolute)
            .transpose()
    }
}
