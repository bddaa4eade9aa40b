/*!
 # yaml2mcp

 Keep a YAML inventory of MCP servers in sync with locally running server
 processes and with the `mcp.json` file an MCP client reads.

 ## Overview

 yaml2mcp provides functionality to:
 - Start, stop and track named server processes with a `stopped` / `running` / `error` status
 - Stop servers gracefully, falling back to a forceful kill after a timeout
 - Notice servers that crash and report why
 - Regenerate `mcp.json` so it lists exactly the servers that are running

 ## Basic Usage

 ```no_run
 use yaml2mcp::config::Settings;
 use yaml2mcp::{Reconciler, Result};
 use std::path::Path;

 #[tokio::main]
 async fn main() -> Result<()> {
     let reconciler = Reconciler::for_workspace(Path::new("."), &Settings::default());

     // Seed every server in mcp.yaml and write .vscode/mcp.json
     reconciler.sync()?;

     // Start a server; it shows up in mcp.json
     reconciler.start_server("fetch")?;

     for status in reconciler.manager().all_statuses() {
         println!("{}: {}", status.name, status.state);
     }

     // Stop everything on the way out
     reconciler.shutdown().await?;
     Ok(())
 }
 ```

 ## Features

 - **Process Management**: Graceful-then-forceful stops, crash detection, stderr capture
 - **Configuration**: YAML inventory, JSON artifact, workspace path templates
 - **Error Handling**: Per-server errors that never affect other servers
 - **Async Support**: Built on Tokio; stops of different servers run concurrently
*/

pub mod config;
pub mod error;
pub mod server;
pub mod sync;

pub use config::{Artifact, Inventory, Settings};
pub use error::{Error, Result};
pub use server::{ProcessManager, ServerDefinition, ServerId, ServerState, ServerStatus};
pub use sync::{Reconciler, SyncPaths};
