use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};
use yaml2mcp::config::Settings;
use yaml2mcp::error::Result;
use yaml2mcp::Reconciler;

/// Syncs a workspace, starts every server in its inventory and stops them
/// all on Ctrl-C.
///
/// Usage: `cargo run --example sync_workspace -- [workspace-folder]`
#[tokio::main]
async fn main() -> Result<()> {
    // `with_env_filter` reads RUST_LOG, e.g. RUST_LOG=yaml2mcp=debug
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .init();

    let workspace = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let reconciler = Reconciler::for_workspace(&workspace, &Settings::default());

    let inventory_path = reconciler.ensure_inventory()?;
    println!("Using inventory {}", inventory_path.display());
    reconciler.sync()?;

    let names: Vec<String> = reconciler
        .manager()
        .all_statuses()
        .into_iter()
        .map(|s| s.name)
        .collect();
    for name in &names {
        match reconciler.start_server(name) {
            Ok(id) => println!("Started {} ({})", name, id),
            Err(e) => println!("Failed to start {}: {}", name, e),
        }
    }

    println!("\nServer status:");
    for status in reconciler.manager().all_statuses() {
        match status.error_detail {
            Some(detail) => println!("- {}: {} ({})", status.name, status.state, detail),
            None => println!("- {}: {}", status.name, status.state),
        }
    }

    println!("\nPress Ctrl-C to stop all servers");
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
    }

    reconciler.shutdown().await?;
    println!("All servers stopped");
    Ok(())
}
