//! Bounded retries with a fixed backoff, shared by every retryable install step.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep, timeout};

use super::install_log::RunJournal;
use super::runner::RunError;

/// Whether exhausting a step's attempts fails the whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criticality {
    Critical,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    /// An optional step gave up; the run continues without it
    Degraded,
}

#[derive(Debug, Error)]
#[error("{step} failed after {attempts} attempts")]
pub struct StepFailed {
    pub step: String,
    pub attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub backoff: Duration,
    pub criticality: Criticality,
}

impl RetryPolicy {
    /// Container runtime install: script fetch (60s) plus script run (300s)
    pub fn runtime_install() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(360),
            backoff: Duration::from_secs(5),
            criticality: Criticality::Critical,
        }
    }

    /// Private-network client install (60s + 120s) and join
    pub fn private_network() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(240),
            backoff: Duration::from_secs(5),
            criticality: Criticality::Optional,
        }
    }

    pub fn stack_up() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(300),
            backoff: Duration::from_secs(10),
            criticality: Criticality::Critical,
        }
    }

    /// Run `op` until it succeeds or the attempts run out.
    ///
    /// Each attempt is bounded by `attempt_timeout`. The backoff only
    /// separates attempts, so N attempts wait N-1 times.
    pub async fn run<F, Fut>(
        &self,
        journal: &RunJournal,
        step: &str,
        mut op: F,
    ) -> Result<StepOutcome, StepFailed>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let attempts = self.max_attempts.max(1);

        for attempt in 1..=attempts {
            match timeout(self.attempt_timeout, op()).await {
                Ok(Ok(())) => return Ok(StepOutcome::Completed),
                Ok(Err(e)) if is_timeout(&e) => {
                    journal.error(format!("{} timed out (attempt {}/{})", step, attempt, attempts));
                }
                Ok(Err(e)) => {
                    journal.error(format!(
                        "Error during {} (attempt {}/{}): {:#}",
                        step, attempt, attempts, e
                    ));
                }
                Err(_) => {
                    journal.error(format!("{} timed out (attempt {}/{})", step, attempt, attempts));
                }
            }

            if attempt < attempts {
                journal.log(format!(
                    "Retrying {} in {} seconds...",
                    step,
                    self.backoff.as_secs()
                ));
                sleep(self.backoff).await;
            }
        }

        match self.criticality {
            Criticality::Critical => {
                journal.error(format!("{} failed after {} attempts", step, attempts));
                Err(StepFailed {
                    step: step.to_string(),
                    attempts,
                })
            }
            Criticality::Optional => {
                journal.log(format!(
                    "{} failed after {} attempts; continuing without it",
                    step, attempts
                ));
                Ok(StepOutcome::Degraded)
            }
        }
    }
}

fn is_timeout(err: &anyhow::Error) -> bool {
    err.downcast_ref::<RunError>()
        .is_some_and(RunError::is_timeout)
}
