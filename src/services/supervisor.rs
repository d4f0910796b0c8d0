//! Owns the background installation task.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::{AbortHandle, JoinError};
use tokio_util::task::TaskTracker;

use super::install_log::{InstallLog, RunId, RunJournal};
use super::orchestrator::Orchestrator;
use super::store::{ConfigStore, StoreError};
use crate::models::InstallationStatus;

#[derive(Debug, Error)]
pub enum StartError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Server is shutting down")]
    ShuttingDown,
}

/// Starts installation runs and tracks them until they finish.
///
/// At most one run is in flight; the guard is the `in_progress` status itself.
#[derive(Clone)]
pub struct InstallSupervisor {
    store: ConfigStore,
    log: InstallLog,
    orchestrator: Arc<Orchestrator>,
    tracker: TaskTracker,
    active: Arc<Mutex<Option<ActiveRun>>>,
}

struct ActiveRun {
    run: RunId,
    abort: AbortHandle,
}

impl InstallSupervisor {
    pub fn new(store: ConfigStore, log: InstallLog, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            store,
            log,
            orchestrator,
            tracker: TaskTracker::new(),
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Snapshot the documents, claim the status and spawn the run.
    ///
    /// Returns as soon as the run is spawned. Must be called inside a Tokio runtime.
    pub fn start(&self) -> Result<RunId, StartError> {
        if self.tracker.is_closed() {
            return Err(StartError::ShuttingDown);
        }

        let services = self.store.load_services()?;
        let config = self.store.begin_install()?;

        let run = RunId::new();
        tracing::info!(run_id = %run, "Installation started");

        let journal = RunJournal::new(self.log.clone(), run);
        let inner = {
            let orchestrator = self.orchestrator.clone();
            let journal = journal.clone();
            tokio::spawn(async move { orchestrator.run(&journal, &config, &services).await })
        };
        *self.active.lock() = Some(ActiveRun {
            run,
            abort: inner.abort_handle(),
        });

        let orchestrator = self.orchestrator.clone();
        let active = self.active.clone();
        self.tracker.spawn(async move {
            match inner.await {
                Ok(_) => {}
                Err(e) if e.is_cancelled() => {
                    journal.error("Installation interrupted by shutdown");
                    orchestrator.finish(&journal, InstallationStatus::Failed);
                }
                Err(e) => {
                    journal.error(format!(
                        "Unexpected error during installation: {}",
                        describe_join_error(e)
                    ));
                    orchestrator.finish(&journal, InstallationStatus::Failed);
                }
            }

            let mut active = active.lock();
            if active.as_ref().map(|a| a.run) == Some(run) {
                *active = None;
            }
        });

        Ok(run)
    }

    /// Id of the run in flight, if any
    pub fn active_run(&self) -> Option<RunId> {
        self.active.lock().as_ref().map(|a| a.run)
    }

    /// Stop accepting runs and wait up to `grace` for the current one.
    ///
    /// A run still going after that is aborted and recorded as failed.
    pub async fn shutdown(&self, grace: Duration) {
        self.tracker.close();
        if tokio::time::timeout(grace, self.tracker.wait()).await.is_ok() {
            return;
        }

        if let Some(active) = self.active.lock().as_ref() {
            tracing::warn!(run_id = %active.run, "Installation still running at shutdown");
            active.abort.abort();
        }
        self.tracker.wait().await;
    }
}

fn describe_join_error(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "task panicked".to_string()
    }
}
