use std::env;
use std::path::PathBuf;
use std::time::Duration;

use super::paths::PathsConfig;

/// Which manifest renderer to wire in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererMode {
    /// Run the external generator script
    Script,
    /// Render the compose file in-process
    Builtin,
    /// Script when the generator exists, builtin otherwise
    Auto,
}

#[derive(Debug, Clone)]
pub struct InstallConfig {
    pub renderer: RendererMode,
    pub compose_generator: PathBuf,
    /// How long shutdown waits for an in-flight installation
    pub shutdown_grace: Duration,
}

impl InstallConfig {
    pub fn from_env(paths: &PathsConfig) -> Self {
        let renderer = match env::var("PIPVR_RENDERER")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "script" => RendererMode::Script,
            "builtin" => RendererMode::Builtin,
            _ => RendererMode::Auto,
        };

        Self {
            renderer,
            compose_generator: env::var("PIPVR_COMPOSE_GENERATOR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| paths.base_dir.join("scripts").join("generate-compose.sh")),
            shutdown_grace: Duration::from_secs(
                env::var("PIPVR_SHUTDOWN_GRACE_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Resolve `Auto` against the filesystem
    pub fn use_script_renderer(&self) -> bool {
        match self.renderer {
            RendererMode::Script => true,
            RendererMode::Builtin => false,
            RendererMode::Auto => self.compose_generator.is_file(),
        }
    }
}
