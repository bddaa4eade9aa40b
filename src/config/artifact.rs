use crate::config::Inventory;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// One server entry in the generated `mcp.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactServer {
    /// Command to execute
    pub command: String,

    /// Arguments, omitted when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Environment overrides, omitted when empty
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Working directory as written in the inventory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

/// The generated `mcp.json` consumed by the MCP client.
///
/// ```json
/// {
///   "mcpServers": {
///     "fetch": { "command": "uvx", "args": ["mcp-server-fetch"] }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Servers keyed by name
    #[serde(rename = "mcpServers", default)]
    pub mcp_servers: BTreeMap<String, ArtifactServer>,
}

impl Artifact {
    /// Every server of the inventory.
    pub fn from_inventory(inventory: &Inventory) -> Self {
        let mcp_servers = inventory
            .servers
            .iter()
            .map(|server| {
                (
                    server.name.clone(),
                    ArtifactServer {
                        command: server.command.clone(),
                        args: server.args.clone(),
                        env: server.env.clone(),
                        cwd: server.working_directory.clone(),
                    },
                )
            })
            .collect();

        Self { mcp_servers }
    }

    /// Only the inventory servers whose names are in `running`.
    pub fn from_inventory_filtered(inventory: &Inventory, running: &BTreeSet<String>) -> Self {
        let mut artifact = Self::from_inventory(inventory);
        artifact.mcp_servers.retain(|name, _| running.contains(name));
        artifact
    }

    /// Reads an artifact; `Ok(None)` when the file does not exist.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigParse(format!("Failed to read JSON config: {}", e)))?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| Error::ConfigParse(format!("Failed to read JSON config: {}", e)))
    }

    /// Writes pretty-printed JSON, creating parent directories.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::ConfigWrite(format!("Failed to write JSON config: {}", e)))?;

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| Error::ConfigWrite(format!("Failed to write JSON config: {}", e)))?;
        }
        std::fs::write(path, content)
            .map_err(|e| Error::ConfigWrite(format!("Failed to write JSON config: {}", e)))?;

        tracing::debug!(
            path = %path.display(),
            servers = self.mcp_servers.len(),
            "Wrote MCP JSON config"
        );
        Ok(())
    }
}
