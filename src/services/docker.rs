use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::runner::{run_checked, CommandOutput, CommandRunner, CommandSpec};

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const LIST_TIMEOUT: Duration = Duration::from_secs(15);
const CONTROL_TIMEOUT: Duration = Duration::from_secs(60);
const COMPOSE_RESTART_TIMEOUT: Duration = Duration::from_secs(180);
const LOGS_TIMEOUT: Duration = Duration::from_secs(15);

/// Line format requested from `docker ps`
pub const PS_FORMAT: &str = "{{.Names}}|{{.Status}}|{{.Ports}}";

/// Container runtime CLI
#[derive(Clone)]
pub struct DockerClient {
    runner: Arc<dyn CommandRunner>,
}

impl DockerClient {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Output of `docker --version`, or `None` when the CLI is missing
    pub async fn version(&self) -> Option<String> {
        let spec = CommandSpec::new("docker").arg("--version");
        match self.runner.run(&spec, PROBE_TIMEOUT).await {
            Ok(output) if output.success => Some(output.stdout.trim().to_string()),
            _ => None,
        }
    }

    /// Raw `docker ps -a` listing in [`PS_FORMAT`]
    pub async fn list_containers(&self) -> anyhow::Result<String> {
        let spec = CommandSpec::new("docker")
            .args(["ps", "-a", "--format", PS_FORMAT]);
        let output = self.checked(&spec, LIST_TIMEOUT).await?;
        Ok(output.stdout)
    }

    pub async fn start(&self, container: &str) -> anyhow::Result<()> {
        self.control("start", container).await
    }

    pub async fn stop(&self, container: &str) -> anyhow::Result<()> {
        self.control("stop", container).await
    }

    pub async fn restart(&self, container: &str) -> anyhow::Result<()> {
        self.control("restart", container).await
    }

    /// `docker compose -f <manifest> up -d`, bounded by `limit`
    pub async fn compose_up(&self, manifest: &Path, limit: Duration) -> anyhow::Result<()> {
        let spec = compose(manifest).args(["up", "-d"]);
        self.checked(&spec, limit).await.map(|_| ())
    }

    /// Restart every service of a deployed manifest
    pub async fn compose_restart(&self, manifest: &Path) -> anyhow::Result<()> {
        let spec = compose(manifest).arg("restart");
        self.checked(&spec, COMPOSE_RESTART_TIMEOUT).await.map(|_| ())
    }

    /// Last `lines` lines of a container's output, stdout and stderr combined
    pub async fn logs(&self, container: &str, lines: u32) -> anyhow::Result<String> {
        let spec = CommandSpec::new("docker")
            .args(["logs", "--tail"])
            .arg(lines.to_string())
            .arg(container);
        let output = self.checked(&spec, LOGS_TIMEOUT).await?;
        Ok(format!("{}{}", output.stdout, output.stderr))
    }

    async fn control(&self, action: &str, container: &str) -> anyhow::Result<()> {
        let spec = CommandSpec::new("docker").args([action, container]);
        self.checked(&spec, CONTROL_TIMEOUT).await?;
        tracing::info!(container, action, "Container action completed");
        Ok(())
    }

    async fn checked(&self, spec: &CommandSpec, limit: Duration) -> anyhow::Result<CommandOutput> {
        run_checked(self.runner.as_ref(), spec, limit).await
    }
}

fn compose(manifest: &Path) -> CommandSpec {
    CommandSpec::new("docker")
        .args(["compose", "-f"])
        .arg(manifest.display().to_string())
}
