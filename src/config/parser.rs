use crate::error::{Error, Result};
use crate::server::ServerDefinition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// The YAML server inventory.
///
/// # YAML Schema
///
/// ```yaml
/// version: "1.0"
/// servers:
///   - name: filesystem
///     command: npx
///     args: ["-y", "@modelcontextprotocol/server-filesystem", "/data"]
///   - name: local
///     command: node
///     args: [server.js]
///     env:
///       NODE_ENV: production
///     cwd: ./servers/local
/// ```
///
/// # Examples
///
/// ```
/// use yaml2mcp::config::Inventory;
///
/// let inventory = Inventory::parse_from_str("servers:\n  - name: fetch\n    command: uvx\n").unwrap();
/// assert!(inventory.server("fetch").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// Schema version, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Servers in declaration order.
    pub servers: Vec<ServerDefinition>,
}

impl Inventory {
    /// Loads the inventory from a YAML file.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The file exists but cannot be read
    /// * The contents are not valid YAML
    /// * The `servers` sequence is missing or malformed
    pub fn from_file(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigParse(format!("Failed to read YAML config: {}", e)))?;

        Self::parse_from_str(&content).map(Some)
    }

    /// Parses the inventory from a YAML string.
    pub fn parse_from_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigParse(format!("Failed to parse YAML config: {}", e)))
    }

    /// Writes the inventory as YAML, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigWrite(format!("Failed to serialize YAML config: {}", e)))?;

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| Error::ConfigWrite(format!("Failed to save YAML config: {}", e)))?;
        }
        std::fs::write(path, content)
            .map_err(|e| Error::ConfigWrite(format!("Failed to save YAML config: {}", e)))
    }

    /// Starter inventory with a single example server.
    pub fn default_inventory() -> Self {
        Self {
            version: Some("1.0".to_string()),
            servers: vec![ServerDefinition {
                name: "example-server".to_string(),
                command: "node".to_string(),
                args: vec!["server.js".to_string()],
                env: BTreeMap::new(),
                working_directory: None,
            }],
        }
    }

    /// Look up a server by name.
    pub fn server(&self, name: &str) -> Option<&ServerDefinition> {
        self.servers.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inventory() {
        let yaml = r#"version: "1.0"
servers:
  - name: test-server
    command: node
    args:
      - server.js
    env:
      NODE_ENV: test
    cwd: ./srv
"#;

        let inventory = Inventory::parse_from_str(yaml).unwrap();

        assert_eq!(inventory.version.as_deref(), Some("1.0"));
        assert_eq!(inventory.servers.len(), 1);

        let server = &inventory.servers[0];
        assert_eq!(server.name, "test-server");
        assert_eq!(server.command, "node");
        assert_eq!(server.args, vec!["server.js"]);
        assert_eq!(server.env.get("NODE_ENV").map(String::as_str), Some("test"));
        assert_eq!(
            server.working_directory.as_deref(),
            Some(Path::new("./srv"))
        );
    }

    #[test]
    fn test_invalid_structure_is_rejected() {
        let err = Inventory::parse_from_str("invalid: yaml: content:").unwrap_err();
        assert!(err.to_string().contains("Failed to parse YAML config"));

        let err = Inventory::parse_from_str("version: \"1.0\"\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_default_inventory() {
        let inventory = Inventory::default_inventory();
        assert_eq!(inventory.version.as_deref(), Some("1.0"));
        assert_eq!(inventory.servers.len(), 1);
        assert!(inventory.server("example-server").is_some());
    }
}
