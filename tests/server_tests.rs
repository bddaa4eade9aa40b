#![cfg(unix)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use yaml2mcp::error::{Error, Result};
use yaml2mcp::server::{ExitCallback, ProcessManager, ServerDefinition, ServerState};

fn shell(name: &str, script: &str) -> ServerDefinition {
    ServerDefinition::new(name, "sh").with_args(["-c", script])
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_start_and_stop_long_running_process() -> Result<()> {
    let manager = ProcessManager::new();
    let definition = ServerDefinition::new("sleeper", "sleep").with_args(["30"]);

    manager.seed(&definition);
    assert_eq!(
        manager.status_of("sleeper").map(|s| s.state),
        Some(ServerState::Stopped)
    );

    manager.start(&definition, None)?;
    assert!(manager.is_running("sleeper"));

    let started = Instant::now();
    manager.stop("sleeper").await?;

    // sleep honours SIGTERM, so no forced kill is needed
    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(!manager.is_running("sleeper"));
    assert_eq!(
        manager.status_of("sleeper").map(|s| s.state),
        Some(ServerState::Stopped)
    );

    Ok(())
}

#[tokio::test]
async fn test_clean_exit_without_stop() -> Result<()> {
    let manager = ProcessManager::new();
    let exits = Arc::new(AtomicUsize::new(0));
    let counter = exits.clone();
    let on_exit: ExitCallback = Arc::new(move |_: &str| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    manager.start(&shell("quick", "exit 0"), Some(on_exit))?;

    wait_until(|| exits.load(Ordering::SeqCst) == 1).await;
    assert_eq!(
        manager.status_of("quick").map(|s| s.state),
        Some(ServerState::Stopped)
    );
    Ok(())
}

#[tokio::test]
async fn test_crash_is_reported_with_exit_code_and_stderr() -> Result<()> {
    let manager = ProcessManager::new();

    manager.start(&shell("crasher", "echo boom >&2; exit 7"), None)?;

    wait_until(|| !manager.is_running("crasher")).await;
    let status = manager.status_of("crasher").expect("status");
    assert_eq!(status.state, ServerState::Error);
    assert!(status.error_detail.expect("detail").contains("code 7"));

    wait_until(|| {
        manager
            .stderr_of("crasher")
            .is_some_and(|text| text.contains("boom"))
    })
    .await;
    Ok(())
}

#[tokio::test]
async fn test_process_ignoring_sigterm_is_killed() -> Result<()> {
    let timeout = Duration::from_millis(300);
    let manager = ProcessManager::new().with_stop_timeout(timeout);

    manager.start(
        &shell("stubborn", "trap '' TERM; while true; do sleep 0.1; done"),
        None,
    )?;
    // Give the shell time to install its trap
    tokio::time::sleep(Duration::from_millis(300)).await;

    let started = Instant::now();
    manager.stop("stubborn").await?;

    assert!(started.elapsed() >= timeout);
    assert!(!manager.is_running("stubborn"));
    assert_eq!(
        manager.status_of("stubborn").map(|s| s.state),
        Some(ServerState::Stopped)
    );
    Ok(())
}

#[tokio::test]
async fn test_environment_and_working_directory_are_applied() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("marker"), "").expect("write marker");

    let manager = ProcessManager::new();
    let mut definition = shell(
        "env-check",
        r#"test "$YAML2MCP_TEST" = expected && test -f marker"#,
    );
    definition
        .env
        .insert("YAML2MCP_TEST".to_string(), "expected".to_string());
    definition.working_directory = Some(dir.path().to_path_buf());

    manager.start(&definition, None)?;

    wait_until(|| !manager.is_running("env-check")).await;
    let status = manager.status_of("env-check").expect("status");
    assert_eq!(status.state, ServerState::Stopped, "{:?}", status.error_detail);
    Ok(())
}

#[tokio::test]
async fn test_arguments_are_not_shell_interpreted() -> Result<()> {
    let manager = ProcessManager::new();
    // `exit 3` is passed to sleep as a literal argument, which sleep rejects
    let definition = ServerDefinition::new("literal", "sleep").with_args(["0; exit 3"]);

    manager.start(&definition, None)?;

    wait_until(|| !manager.is_running("literal")).await;
    let status = manager.status_of("literal").expect("status");
    assert_eq!(status.state, ServerState::Error);
    assert!(!status.error_detail.expect("detail").contains("code 3"));
    Ok(())
}

#[tokio::test]
async fn test_missing_executable() {
    let manager = ProcessManager::new();
    let definition = ServerDefinition::new("ghost", "definitely-not-a-real-binary-4242");

    let err = manager.start(&definition, None).unwrap_err();

    assert!(matches!(err, Error::SpawnFailed { .. }));
    assert!(!manager.is_running("ghost"));
    assert_eq!(
        manager.status_of("ghost").map(|s| s.state),
        Some(ServerState::Error)
    );
}

#[tokio::test]
async fn test_stop_all_real_processes() -> Result<()> {
    let manager = ProcessManager::new().with_stop_timeout(Duration::from_millis(300));
    for name in ["one", "two", "three"] {
        manager.start(&ServerDefinition::new(name, "sleep").with_args(["30"]), None)?;
    }
    assert_eq!(manager.running_names().len(), 3);

    manager.stop_all().await?;

    assert!(manager.running_names().is_empty());
    Ok(())
}
