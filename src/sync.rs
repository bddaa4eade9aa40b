//! Reconciliation between the inventory, the processes and the artifact.
//!
//! [`Reconciler`] is the driver an editor integration or a CLI calls into:
//! after every user action, file-change event or unsolicited process exit it
//! reloads the inventory, seeds the manager with every known server, and
//! rewrites `mcp.json` so it lists exactly the servers that are running.

use crate::config::{Artifact, Inventory, Settings, validate_inventory};
use crate::error::{Error, Result};
use crate::server::{ExitCallback, ProcessManager, ServerDefinition, ServerId};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the inventory is read from and the artifact written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPaths {
    /// YAML inventory
    pub inventory: PathBuf,
    /// Generated JSON artifact
    pub artifact: PathBuf,
}

impl SyncPaths {
    /// Paths for a workspace folder according to the settings.
    pub fn for_workspace(workspace_folder: &Path, settings: &Settings) -> Self {
        Self {
            inventory: settings.inventory_path(workspace_folder),
            artifact: settings.artifact_path(workspace_folder),
        }
    }
}

/// Keeps the artifact in line with the manager's running servers.
///
/// Cloning is cheap; clones share the same manager.
#[derive(Clone)]
pub struct Reconciler {
    manager: Arc<ProcessManager>,
    paths: Arc<SyncPaths>,
}

impl Reconciler {
    /// Create a reconciler around an existing manager.
    pub fn new(manager: Arc<ProcessManager>, paths: SyncPaths) -> Self {
        Self {
            manager,
            paths: Arc::new(paths),
        }
    }

    /// Create a reconciler with a fresh manager for a workspace folder.
    pub fn for_workspace(workspace_folder: &Path, settings: &Settings) -> Self {
        let manager = ProcessManager::new().with_stop_timeout(settings.stop_timeout());
        Self::new(
            Arc::new(manager),
            SyncPaths::for_workspace(workspace_folder, settings),
        )
    }

    /// The shared process manager.
    pub fn manager(&self) -> &Arc<ProcessManager> {
        &self.manager
    }

    /// The inventory and artifact paths.
    pub fn paths(&self) -> &SyncPaths {
        &self.paths
    }

    /// Reload the inventory, seed every server and rewrite the artifact.
    ///
    /// Without an inventory the names found in an existing artifact are
    /// seeded and the artifact is left as it is.
    #[tracing::instrument(skip(self), fields(inventory = %self.paths.inventory.display()))]
    pub fn sync(&self) -> Result<()> {
        let Some(inventory) = Inventory::from_file(&self.paths.inventory)? else {
            tracing::debug!("No inventory, seeding from existing artifact");
            if let Some(artifact) = Artifact::from_file(&self.paths.artifact)? {
                for (name, server) in artifact.mcp_servers {
                    self.manager.seed(&ServerDefinition {
                        name,
                        command: server.command,
                        args: server.args,
                        env: server.env,
                        working_directory: server.cwd,
                    });
                }
            }
            return Ok(());
        };

        validate_inventory(&inventory)?;
        for server in &inventory.servers {
            self.manager.seed(server);
        }
        self.write_artifact(&inventory)
    }

    /// Start a server from the inventory and publish it in the artifact.
    ///
    /// If the process later exits on its own the reconciler re-syncs, so the
    /// artifact never lists a dead server for long.
    #[tracing::instrument(skip(self))]
    pub fn start_server(&self, name: &str) -> Result<ServerId> {
        let inventory = Inventory::from_file(&self.paths.inventory)?
            .ok_or_else(|| Error::ServerNotFound(name.to_string()))?;
        let definition = inventory
            .server(name)
            .ok_or_else(|| Error::ServerNotFound(name.to_string()))?;

        let reconciler = self.clone();
        // Runs on the exit observer task; the re-sync does file I/O.
        let on_exit: ExitCallback = Arc::new(move |name: &str| {
            tracing::debug!(server = %name, "Server exited, re-syncing");
            let reconciler = reconciler.clone();
            let name = name.to_string();
            tokio::task::spawn_blocking(move || {
                if let Err(e) = reconciler.sync() {
                    tracing::warn!(server = %name, error = %e, "Re-sync after exit failed");
                }
            });
        });

        let id = self.manager.start(definition, Some(on_exit))?;
        self.write_artifact(&inventory)?;
        Ok(id)
    }

    /// Stop a server and drop it from the artifact.
    #[tracing::instrument(skip(self))]
    pub async fn stop_server(&self, name: &str) -> Result<()> {
        self.manager.stop(name).await?;
        self.rewrite_artifact()
    }

    /// Stop every server and leave an artifact listing none of them.
    ///
    /// The artifact is rewritten even when some stops failed; the stop
    /// failures take precedence in the returned error.
    #[tracing::instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<()> {
        let stopped = self.manager.stop_all().await;
        let rewritten = self.rewrite_artifact();
        stopped.and(rewritten)
    }

    /// Create the default inventory if none exists, returning its path.
    pub fn ensure_inventory(&self) -> Result<PathBuf> {
        let path = &self.paths.inventory;
        if !path.exists() {
            tracing::info!(path = %path.display(), "Creating default inventory");
            Inventory::default_inventory().save(path)?;
        }
        Ok(path.clone())
    }

    fn rewrite_artifact(&self) -> Result<()> {
        match Inventory::from_file(&self.paths.inventory)? {
            Some(inventory) => self.write_artifact(&inventory),
            None => Ok(()),
        }
    }

    fn write_artifact(&self, inventory: &Inventory) -> Result<()> {
        let running = self.manager.running_names();
        Artifact::from_inventory_filtered(inventory, &running).write(&self.paths.artifact)
    }
}
