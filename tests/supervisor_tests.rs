//! Background installation task tests
//!
//! Covers the single-run guard, panic containment, and shutdown handling.

use std::sync::Arc;
use std::time::Duration;

mod common;
use common::{
    build_app_state, build_state_with, PanickingRenderer, ScriptedRunner, SlowRenderer,
    StalledRenderer, TestEnv,
};

use pipvr::models::InstallationStatus;
use pipvr::services::store::StoreError;
use pipvr::services::supervisor::StartError;

fn stored_status(env: &TestEnv) -> InstallationStatus {
    env.state.store.load_config().unwrap().installation_status
}

/// Poll until the stored status leaves `in_progress`
async fn wait_for_terminal(env: &TestEnv) -> InstallationStatus {
    for _ in 0..500 {
        let status = stored_status(env);
        if status.is_terminal() {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("installation never finished:\n{}", env.log_contents());
}

#[tokio::test]
async fn test_start_claims_status_and_returns_immediately() {
    let env = build_state_with(ScriptedRunner::new(), Some(Arc::new(StalledRenderer)));

    let run = env.state.supervisor.start().unwrap();

    assert_eq!(stored_status(&env), InstallationStatus::InProgress);
    assert_eq!(env.state.supervisor.active_run(), Some(run));
}

#[tokio::test]
async fn test_second_start_is_rejected_while_running() {
    let env = build_state_with(ScriptedRunner::new(), Some(Arc::new(StalledRenderer)));

    let first = env.state.supervisor.start().unwrap();
    tokio::task::yield_now().await;
    let second = env.state.supervisor.start();

    assert!(matches!(
        second,
        Err(StartError::Store(StoreError::InstallInProgress))
    ));
    assert_eq!(env.state.supervisor.active_run(), Some(first));
}

#[tokio::test]
async fn test_run_completes_and_clears_active_run() {
    let env = build_app_state();

    let run = env.state.supervisor.start().unwrap();
    let status = wait_for_terminal(&env).await;

    assert_eq!(status, InstallationStatus::Completed);
    env.state.supervisor.shutdown(Duration::from_secs(5)).await;
    assert_eq!(env.state.supervisor.active_run(), None);

    let log = env.log_contents();
    assert!(log.contains(&format!("[run {}]", run.short())));
    assert!(log.contains("Installation completed with status: completed"));
}

#[tokio::test]
async fn test_new_run_allowed_after_previous_finished() {
    let env = build_app_state();

    let first = env.state.supervisor.start().unwrap();
    wait_for_terminal(&env).await;
    let second = env.state.supervisor.start().unwrap();
    wait_for_terminal(&env).await;

    assert_ne!(first, second);
    let log = env.log_contents();
    assert!(log.contains(&format!("[run {}]", first.short())));
    assert!(log.contains(&format!("[run {}]", second.short())));
    assert_eq!(log.matches("Starting installation").count(), 2);
}

#[tokio::test]
async fn test_panicking_run_is_recorded_as_failed() {
    let env = build_state_with(ScriptedRunner::new(), Some(Arc::new(PanickingRenderer)));

    env.state.supervisor.start().unwrap();
    env.state.supervisor.shutdown(Duration::from_secs(5)).await;

    assert_eq!(stored_status(&env), InstallationStatus::Failed);
    assert_eq!(env.state.supervisor.active_run(), None);

    let log = env.log_contents();
    assert!(log.contains("Unexpected error during installation: renderer exploded"));
    assert!(log.contains("Installation completed with status: failed"));
}

#[tokio::test]
async fn test_shutdown_marks_stalled_run_failed() {
    let env = build_state_with(ScriptedRunner::new(), Some(Arc::new(StalledRenderer)));

    env.state.supervisor.start().unwrap();
    env.state.supervisor.shutdown(Duration::from_millis(50)).await;

    assert_eq!(stored_status(&env), InstallationStatus::Failed);
    assert_eq!(env.state.supervisor.active_run(), None);
    let log = env.log_contents();
    assert!(log.contains("Installation interrupted by shutdown"));
    assert_eq!(log.matches("Installation completed with status: failed").count(), 1);
}

#[tokio::test]
async fn test_run_outliving_grace_is_aborted() {
    let env = build_state_with(
        ScriptedRunner::new(),
        Some(Arc::new(SlowRenderer(Duration::from_millis(300)))),
    );

    env.state.supervisor.start().unwrap();
    env.state.supervisor.shutdown(Duration::from_millis(50)).await;
    assert_eq!(stored_status(&env), InstallationStatus::Failed);
    assert_eq!(env.state.supervisor.active_run(), None);

    // Long enough for the render to have finished had the run survived
    tokio::time::sleep(Duration::from_millis(800)).await;

    assert_eq!(stored_status(&env), InstallationStatus::Failed);
    let log = env.log_contents();
    assert_eq!(log.matches("Installation completed with status:").count(), 1);
    assert!(log.contains("Installation interrupted by shutdown"));
    assert!(!log.contains("Generated docker-compose.yml"));
    assert!(!log.contains("Docker Compose file generated successfully"));
    assert!(env.runner.calls().is_empty());
}

#[tokio::test]
async fn test_start_after_shutdown_is_refused() {
    let env = build_app_state();

    env.state.supervisor.shutdown(Duration::from_millis(10)).await;

    assert!(matches!(
        env.state.supervisor.start(),
        Err(StartError::ShuttingDown)
    ));
    assert_eq!(stored_status(&env), InstallationStatus::NotStarted);
}

#[tokio::test]
async fn test_stale_in_progress_is_recovered() {
    let env = build_app_state();
    env.state
        .store
        .set_status(InstallationStatus::InProgress)
        .unwrap();

    assert!(env.state.store.recover_interrupted().unwrap());
    assert_eq!(stored_status(&env), InstallationStatus::Failed);
    assert!(!env.state.store.recover_interrupted().unwrap());

    // A recovered store accepts a new run
    env.state.supervisor.start().unwrap();
    assert_eq!(wait_for_terminal(&env).await, InstallationStatus::Completed);
}
