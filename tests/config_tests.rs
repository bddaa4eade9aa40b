use assert_fs::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use yaml2mcp::config::{Artifact, Inventory, Settings, validate_inventory};
use yaml2mcp::error::{Error, Result};
use yaml2mcp::server::ServerDefinition;

#[test]
fn test_load_inventory_from_file() -> Result<()> {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("mcp.yaml");
    file.write_str(
        r#"version: "1.0"
servers:
  - name: filesystem
    command: npx
    args: ["-y", "@modelcontextprotocol/server-filesystem", "/path/to/files"]
  - name: github
    command: npx
    args: ["-y", "@modelcontextprotocol/server-github"]
    env:
      GITHUB_TOKEN: your_token_here
"#,
    )
    .unwrap();

    let inventory = Inventory::from_file(file.path())?.expect("inventory");

    assert_eq!(inventory.servers.len(), 2);
    let fs = inventory.server("filesystem").expect("filesystem");
    assert_eq!(fs.command, "npx");
    assert_eq!(
        fs.args,
        vec![
            "-y",
            "@modelcontextprotocol/server-filesystem",
            "/path/to/files"
        ]
    );
    assert!(fs.env.is_empty());

    let gh = inventory.server("github").expect("github");
    assert_eq!(
        gh.env.get("GITHUB_TOKEN").map(String::as_str),
        Some("your_token_here")
    );

    Ok(())
}

#[test]
fn test_missing_inventory_is_absent() -> Result<()> {
    assert!(Inventory::from_file("/nonexistent/path/mcp.yaml")?.is_none());
    assert!(Artifact::from_file("/nonexistent/path/mcp.json")?.is_none());
    Ok(())
}

#[test]
fn test_save_and_reload_inventory() -> Result<()> {
    let temp = assert_fs::TempDir::new().unwrap();
    let path = temp.child("nested/dir/mcp.yaml");

    Inventory::default_inventory().save(path.path())?;
    assert!(path.path().exists());

    let loaded = Inventory::from_file(path.path())?.expect("inventory");
    assert_eq!(loaded, Inventory::default_inventory());
    Ok(())
}

#[test]
fn test_validate_inventory() {
    let valid = Inventory {
        version: None,
        servers: vec![
            ServerDefinition::new("a", "node"),
            ServerDefinition::new("b", "python"),
        ],
    };
    assert!(validate_inventory(&valid).is_ok());

    let empty_command = Inventory {
        version: None,
        servers: vec![ServerDefinition::new("a", "")],
    };
    assert!(matches!(
        validate_inventory(&empty_command),
        Err(Error::ConfigInvalid(_))
    ));

    let duplicate = Inventory {
        version: None,
        servers: vec![
            ServerDefinition::new("a", "node"),
            ServerDefinition::new("a", "python"),
        ],
    };
    let err = validate_inventory(&duplicate).unwrap_err();
    assert!(err.to_string().contains("more than once"));

    let empty = Inventory {
        version: None,
        servers: Vec::new(),
    };
    assert!(validate_inventory(&empty).is_ok());
}

#[test]
fn test_write_artifact_for_running_servers() -> Result<()> {
    let temp = assert_fs::TempDir::new().unwrap();
    let artifact_path = temp.child(".vscode/mcp.json");

    let inventory = Inventory::parse_from_str(
        r#"servers:
  - name: server1
    command: node
    args: [server.js]
  - name: server2
    command: python
    args: ["-m", "mcp"]
  - name: server3
    command: npm
    args: [start]
"#,
    )?;
    let running: BTreeSet<String> = ["server1".to_string(), "server3".to_string()].into();

    Artifact::from_inventory_filtered(&inventory, &running).write(artifact_path.path())?;

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(artifact_path.path()).unwrap()).unwrap();
    let servers = written["mcpServers"].as_object().expect("mcpServers object");
    assert_eq!(servers.len(), 2);
    assert_eq!(servers["server1"]["command"], "node");
    assert_eq!(servers["server3"]["args"][0], "start");
    assert!(!servers.contains_key("server2"));

    let reread = Artifact::from_file(artifact_path.path())?.expect("artifact");
    assert_eq!(reread.mcp_servers.len(), 2);
    Ok(())
}

#[test]
fn test_settings_defaults_and_paths() -> Result<()> {
    let settings = Settings::parse_from_str("{}")?;
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.stop_timeout(), Duration::from_secs(5));

    let folder = Path::new("/work/project");
    assert_eq!(
        settings.inventory_path(folder),
        PathBuf::from("/work/project/mcp.yaml")
    );
    assert_eq!(
        settings.artifact_path(folder),
        PathBuf::from("/work/project/.vscode/mcp.json")
    );

    let custom = Settings::parse_from_str(
        r#"{ "configPath": "${workspaceRoot}/config/servers.yaml", "stopTimeoutSecs": 2 }"#,
    )?;
    assert_eq!(
        custom.inventory_path(folder),
        PathBuf::from("/work/project/config/servers.yaml")
    );
    assert_eq!(custom.stop_timeout(), Duration::from_secs(2));
    Ok(())
}

#[test]
fn test_invalid_settings_are_rejected() {
    assert!(matches!(
        Settings::parse_from_str(r#"{ "stopTimeoutSecs": "soon" }"#),
        Err(Error::ConfigParse(_))
    ));
}
