//! Configuration module for yaml2mcp.
//!
//! This module handles the files around the process manager: the YAML server
//! inventory the user edits, the `mcp.json` artifact generated for the MCP
//! client, and the settings that say where both live.
//!
//! # Examples
//!
//! Loading an inventory and producing the artifact for the running servers:
//!
//! ```no_run
//! use yaml2mcp::config::{Artifact, Inventory};
//! use std::collections::BTreeSet;
//!
//! let inventory = Inventory::from_file("mcp.yaml").unwrap().expect("inventory exists");
//! let running: BTreeSet<String> = ["fetch".to_string()].into();
//! Artifact::from_inventory_filtered(&inventory, &running)
//!     .write(".vscode/mcp.json")
//!     .unwrap();
//! ```
mod artifact;
mod parser;
mod paths;
mod settings;
pub mod validator;

pub use artifact::{Artifact, ArtifactServer};
pub use parser::Inventory;
pub use paths::resolve_path_template;
pub use settings::Settings;
pub use validator::validate_inventory;
