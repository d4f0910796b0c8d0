//! Host prerequisites installed from vendor install scripts.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::runner::{run_checked, CommandOutput, CommandRunner, CommandSpec};

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const JOIN_TIMEOUT: Duration = Duration::from_secs(60);

/// A remote install script: downloaded with curl, then run with sh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptInstall {
    pub name: &'static str,
    pub url: &'static str,
    pub script_file: &'static str,
    pub fetch_timeout: Duration,
    pub install_timeout: Duration,
}

impl ScriptInstall {
    pub const DOCKER: ScriptInstall = ScriptInstall {
        name: "Docker",
        url: "https://get.docker.com",
        script_file: "get-docker.sh",
        fetch_timeout: Duration::from_secs(60),
        install_timeout: Duration::from_secs(300),
    };

    pub const TAILSCALE: ScriptInstall = ScriptInstall {
        name: "Tailscale",
        url: "https://tailscale.com/install.sh",
        script_file: "install-tailscale.sh",
        fetch_timeout: Duration::from_secs(60),
        install_timeout: Duration::from_secs(120),
    };
}

#[derive(Clone)]
pub struct HostInstaller {
    runner: Arc<dyn CommandRunner>,
    work_dir: PathBuf,
}

impl HostInstaller {
    pub fn new(runner: Arc<dyn CommandRunner>, work_dir: PathBuf) -> Self {
        Self { runner, work_dir }
    }

    /// Fetch and run one install script
    pub async fn install(&self, script: &ScriptInstall) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.work_dir)?;
        let script_path = self.work_dir.join(script.script_file);

        let fetch = CommandSpec::new("curl")
            .args(["-fsSL", script.url, "-o"])
            .arg(script_path.display().to_string());
        if let Err(e) = self.checked(&fetch, script.fetch_timeout).await {
            // curl may leave a partial download behind
            remove_script(&script_path);
            return Err(e);
        }

        let run = CommandSpec::new("sh").arg(script_path.display().to_string());
        let result = self.checked(&run, script.install_timeout).await;
        remove_script(&script_path);
        result.map(|_| ())
    }

    pub async fn docker_installed(&self) -> bool {
        self.probe(CommandSpec::new("docker").arg("--version")).await
    }

    pub async fn tailscale_installed(&self) -> bool {
        self.probe(CommandSpec::new("tailscale").arg("version")).await
    }

    /// Join the tailnet. The key is masked wherever the command is shown.
    pub async fn tailscale_join(&self, auth_key: &str) -> anyhow::Result<()> {
        let spec = CommandSpec::new("sudo")
            .args(["tailscale", "up", "--authkey"])
            .secret_arg(auth_key)
            .arg("--accept-routes=false");
        self.checked(&spec, JOIN_TIMEOUT).await.map(|_| ())
    }

    async fn probe(&self, spec: CommandSpec) -> bool {
        matches!(self.runner.run(&spec, PROBE_TIMEOUT).await, Ok(output) if output.success)
    }

    async fn checked(&self, spec: &CommandSpec, limit: Duration) -> anyhow::Result<CommandOutput> {
        run_checked(self.runner.as_ref(), spec, limit).await
    }
}

fn remove_script(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}
