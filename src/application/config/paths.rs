use std::env;
use std::path::{Path, PathBuf};

/// Filesystem layout of a deployment
#[derive(Debug, Clone)]
pub struct PathsConfig {
    /// Stack root; `.env` and the root-level manifest are written here
    pub base_dir: PathBuf,
    pub config_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub static_dir: PathBuf,
}

impl PathsConfig {
    pub fn from_env() -> Self {
        let base_dir = env::var("PIPVR_BASE_DIR")
            .map(PathBuf::from)
            .or_else(|_| env::current_dir())
            .unwrap_or_else(|_| PathBuf::from("."));

        Self {
            config_dir: dir_from_env("PIPVR_CONFIG_DIR", &base_dir, "config"),
            logs_dir: dir_from_env("PIPVR_LOGS_DIR", &base_dir, "logs"),
            static_dir: dir_from_env("PIPVR_STATIC_DIR", &base_dir, "web-ui"),
            base_dir,
        }
    }

    /// Layout rooted at `base_dir` with every directory at its default location
    pub fn rooted_at(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            config_dir: base_dir.join("config"),
            logs_dir: base_dir.join("logs"),
            static_dir: base_dir.join("web-ui"),
            base_dir,
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    pub fn services_file(&self) -> PathBuf {
        self.config_dir.join("services.json")
    }

    pub fn installation_log(&self) -> PathBuf {
        self.logs_dir.join("installation.log")
    }

    pub fn env_file(&self) -> PathBuf {
        self.base_dir.join(".env")
    }

    /// Preferred manifest location
    pub fn manifest(&self) -> PathBuf {
        self.base_dir.join("docker-compose.yml")
    }

    /// Where the external generator may leave the manifest instead
    pub fn fallback_manifest(&self) -> PathBuf {
        self.base_dir.join("docker-compose").join("docker-compose.yml")
    }

    /// First manifest that exists, root location preferred
    pub fn locate_manifest(&self) -> Option<PathBuf> {
        [self.manifest(), self.fallback_manifest()]
            .into_iter()
            .find(|path| path.is_file())
    }

    /// Scratch space for downloaded install scripts
    pub fn work_dir(&self) -> PathBuf {
        self.base_dir.join(".pipvr")
    }
}

fn dir_from_env(var: &str, base_dir: &Path, default: &str) -> PathBuf {
    env::var(var)
        .map(PathBuf::from)
        .unwrap_or_else(|_| base_dir.join(default))
}
