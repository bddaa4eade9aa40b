use crate::config::resolve_path_template;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// User settings for a synced workspace.
///
/// Every field has a default, so `{}` is a valid settings document.
///
/// ```
/// use yaml2mcp::config::Settings;
///
/// let settings = Settings::parse_from_str(r#"{ "stopTimeoutSecs": 10 }"#).unwrap();
/// assert_eq!(settings.config_path, "${workspaceFolder}/mcp.yaml");
/// assert_eq!(settings.stop_timeout().as_secs(), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Template of the YAML inventory path
    pub config_path: String,
    /// Template of the generated JSON path
    pub mcp_json_path: String,
    /// Graceful-phase timeout for stopping servers
    pub stop_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: "${workspaceFolder}/mcp.yaml".to_string(),
            mcp_json_path: "${workspaceFolder}/.vscode/mcp.json".to_string(),
            stop_timeout_secs: 5,
        }
    }
}

impl Settings {
    /// Loads settings from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigParse(format!("Failed to read settings file: {}", e)))?;

        Self::parse_from_str(&content)
    }

    /// Parses settings from a JSON string.
    pub fn parse_from_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::ConfigParse(format!("Failed to parse settings: {}", e)))
    }

    /// Inventory path for a workspace folder.
    pub fn inventory_path(&self, workspace_folder: &Path) -> PathBuf {
        resolve_path_template(&self.config_path, workspace_folder)
    }

    /// Artifact path for a workspace folder.
    pub fn artifact_path(&self, workspace_folder: &Path) -> PathBuf {
        resolve_path_template(&self.mcp_json_path, workspace_folder)
    }

    /// Graceful-phase timeout as a `Duration`.
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}
