//! The installation pipeline.
//!
//! One run takes a (config, services) snapshot through five ordered steps:
//! render manifest, write `.env`, ensure Docker, ensure Tailscale (optional),
//! bring the stack up. The final status is always persisted.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use super::docker::DockerClient;
use super::env_file::write_env_file;
use super::host::{HostInstaller, ScriptInstall};
use super::install_log::RunJournal;
use super::renderer::ManifestRenderer;
use super::retry::{RetryPolicy, StepFailed, StepOutcome};
use super::store::ConfigStore;
use crate::config::paths::PathsConfig;
use crate::models::{InstallationStatus, ServiceSelection, StackConfig, TailscaleConfig};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to generate Docker Compose file: {0}")]
    Render(String),

    #[error("Failed to create .env file: {0}")]
    EnvFile(#[source] io::Error),

    #[error("Docker Compose file not found at {} or {}", .root.display(), .fallback.display())]
    ManifestMissing { root: PathBuf, fallback: PathBuf },

    #[error(transparent)]
    Step(#[from] StepFailed),
}

pub struct Orchestrator {
    store: ConfigStore,
    renderer: Arc<dyn ManifestRenderer>,
    docker: DockerClient,
    host: HostInstaller,
    paths: PathsConfig,
}

impl Orchestrator {
    pub fn new(
        store: ConfigStore,
        renderer: Arc<dyn ManifestRenderer>,
        docker: DockerClient,
        host: HostInstaller,
        paths: PathsConfig,
    ) -> Self {
        Self {
            store,
            renderer,
            docker,
            host,
            paths,
        }
    }

    /// Execute one run and persist its terminal status
    pub async fn run(
        &self,
        journal: &RunJournal,
        config: &StackConfig,
        services: &ServiceSelection,
    ) -> InstallationStatus {
        journal.log("Starting installation");

        let status = match self.pipeline(journal, config, services).await {
            Ok(()) => InstallationStatus::Completed,
            Err(e) => {
                journal.error(format!("Installation failed: {}", e));
                InstallationStatus::Failed
            }
        };

        self.finish(journal, status);
        status
    }

    /// Persist the terminal status and write the closing log line
    pub fn finish(&self, journal: &RunJournal, status: InstallationStatus) {
        if let Err(e) = self.store.set_status(status) {
            journal.error(format!("Failed to persist installation status: {}", e));
        }
        journal.log(format!("Installation completed with status: {}", status));
    }

    async fn pipeline(
        &self,
        journal: &RunJournal,
        config: &StackConfig,
        services: &ServiceSelection,
    ) -> Result<(), PipelineError> {
        self.render_manifest(journal, config, services).await?;
        self.write_env(journal, config)?;
        self.ensure_docker(journal).await?;
        if config.tailscale.enabled {
            self.ensure_tailscale(journal, &config.tailscale).await;
        }
        self.stack_up(journal).await
    }

    async fn render_manifest(
        &self,
        journal: &RunJournal,
        config: &StackConfig,
        services: &ServiceSelection,
    ) -> Result<(), PipelineError> {
        journal.log("Generating Docker Compose file...");
        let result = self.renderer.render(config, services).await;
        if !result.success {
            let detail = result.error.unwrap_or_default();
            return Err(PipelineError::Render(detail.trim().to_string()));
        }

        if let Some(output) = result.output.as_deref().map(str::trim) {
            if !output.is_empty() {
                journal.log(output);
            }
        }
        journal.log("Docker Compose file generated successfully");
        Ok(())
    }

    fn write_env(&self, journal: &RunJournal, config: &StackConfig) -> Result<(), PipelineError> {
        journal.log("Creating .env file...");
        let path = self.paths.env_file();
        write_env_file(&path, config).map_err(PipelineError::EnvFile)?;
        journal.log(format!("Created .env file at {}", path.display()));
        Ok(())
    }

    async fn ensure_docker(&self, journal: &RunJournal) -> Result<(), PipelineError> {
        journal.log("Checking Docker installation...");
        if self.host.docker_installed().await {
            journal.log("Docker is already installed");
            return Ok(());
        }

        journal.log("Installing Docker...");
        let host = &self.host;
        RetryPolicy::runtime_install()
            .run(journal, "Docker installation", move || {
                host.install(&ScriptInstall::DOCKER)
            })
            .await?;
        journal.log("Docker installed successfully");
        Ok(())
    }

    /// Failures here are logged and never fail the run
    async fn ensure_tailscale(&self, journal: &RunJournal, tailscale: &TailscaleConfig) {
        journal.log("Setting up Tailscale...");
        let installed = self.host.tailscale_installed().await;
        let join_key = tailscale.join_key();

        if installed {
            journal.log("Tailscale is already installed");
            if join_key.is_none() {
                return;
            }
        }

        let host = &self.host;
        let outcome = RetryPolicy::private_network()
            .run(journal, "Tailscale setup", move || async move {
                if !installed {
                    host.install(&ScriptInstall::TAILSCALE).await?;
                }
                if let Some(key) = join_key {
                    host.tailscale_join(key).await?;
                }
                Ok(())
            })
            .await;

        match outcome {
            Ok(StepOutcome::Completed) => journal.log("Tailscale setup completed"),
            _ => journal.log("Continuing installation without Tailscale"),
        }
    }

    async fn stack_up(&self, journal: &RunJournal) -> Result<(), PipelineError> {
        journal.log("Starting Docker containers...");
        let manifest = self
            .paths
            .locate_manifest()
            .ok_or_else(|| PipelineError::ManifestMissing {
                root: self.paths.manifest(),
                fallback: self.paths.fallback_manifest(),
            })?;
        journal.log(format!("Using Docker Compose file {}", manifest.display()));

        let policy = RetryPolicy::stack_up();
        let docker = &self.docker;
        let manifest = manifest.as_path();
        policy
            .run(journal, "Docker Compose up", move || {
                docker.compose_up(manifest, policy.attempt_timeout)
            })
            .await?;

        journal.log("Docker containers started successfully");
        Ok(())
    }
}
