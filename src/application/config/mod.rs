pub mod install;
pub mod paths;
pub mod server;

use once_cell::sync::Lazy;
use std::env;

/// Process configuration loaded from environment variables.
///
/// Read once at startup. The user-editable stack documents are not part of it;
/// those live in the configuration store.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: server::ServerConfig,
    pub paths: paths::PathsConfig,
    pub install: install::InstallConfig,

    // Build info
    pub commit_hash: String,
    pub build_time: String,
    pub version: String,

    // Logging
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    pub fn from_env() -> Self {
        let paths = paths::PathsConfig::from_env();
        Self {
            server: server::ServerConfig::from_env(),
            install: install::InstallConfig::from_env(&paths),
            paths,

            // Build info
            commit_hash: env::var("COMMIT_HASH").unwrap_or_else(|_| "unknown".to_string()),
            build_time: env::var("BUILD_TIME").unwrap_or_else(|_| "unknown".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),

            // Logging
            log_level: env::var("PIPVR_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: match env::var("PIPVR_LOG_FORMAT") {
                Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
        }
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
