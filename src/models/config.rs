use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Lifecycle of an installation run as persisted in the configuration document.
///
/// `not_started -> in_progress -> completed | failed`. A new run may start from any
/// state except `in_progress`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum InstallationStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

impl InstallationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Terminal states end a run; `in_progress` is the only non-terminal state a run can leave behind.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for InstallationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// VPN sidecar settings (gluetun)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, utoipa::ToSchema)]
#[validate(schema(function = "validate_vpn"))]
pub struct VpnConfig {
    pub enabled: bool,
    pub provider: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub region: String,
}

impl Default for VpnConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "private internet access".to_string(),
            username: String::new(),
            password: String::new(),
            region: "Netherlands".to_string(),
        }
    }
}

/// Tailscale private-network settings
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Validate, utoipa::ToSchema,
)]
pub struct TailscaleConfig {
    pub enabled: bool,
    #[serde(default)]
    #[validate(custom(function = "validate_auth_key"))]
    pub auth_key: String,
}

impl TailscaleConfig {
    /// Auth key to join with, if one was provided
    pub fn join_key(&self) -> Option<&str> {
        let key = self.auth_key.trim();
        (!key.is_empty()).then_some(key)
    }
}

/// The single configuration document of a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct StackConfig {
    #[validate(range(max = 65535))]
    pub puid: u32,
    #[validate(range(max = 65535))]
    pub pgid: u32,
    #[validate(length(min = 1, message = "timezone must not be empty"))]
    pub timezone: String,
    #[validate(custom(function = "validate_absolute_path"))]
    pub media_dir: String,
    #[validate(custom(function = "validate_absolute_path"))]
    pub downloads_dir: String,
    #[validate(custom(function = "validate_absolute_path"))]
    pub docker_dir: String,
    #[validate(nested)]
    pub vpn: VpnConfig,
    #[validate(nested)]
    pub tailscale: TailscaleConfig,
    #[serde(default)]
    pub installation_status: InstallationStatus,
}

impl Default for StackConfig {
    fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/root".to_string());
        Self {
            puid: 1000,
            pgid: 1000,
            timezone: "Europe/London".to_string(),
            media_dir: "/mnt/media".to_string(),
            downloads_dir: "/mnt/downloads".to_string(),
            docker_dir: Path::new(&home).join("docker").to_string_lossy().into_owned(),
            vpn: VpnConfig::default(),
            tailscale: TailscaleConfig::default(),
            installation_status: InstallationStatus::NotStarted,
        }
    }
}

impl StackConfig {
    /// Watch folder picked up by torrent clients
    pub fn watch_dir(&self) -> String {
        format!("{}/watch", self.downloads_dir)
    }
}

fn validate_absolute_path(path: &str) -> Result<(), ValidationError> {
    if path.is_empty() || !Path::new(path).is_absolute() {
        let mut err = ValidationError::new("absolute_path");
        err.message = Some(format!("'{}' is not an absolute path", path).into());
        return Err(err);
    }
    Ok(())
}

fn validate_auth_key(key: &str) -> Result<(), ValidationError> {
    if key.trim().chars().any(char::is_whitespace) {
        let mut err = ValidationError::new("auth_key");
        err.message = Some("auth key must not contain whitespace".into());
        return Err(err);
    }
    Ok(())
}

fn validate_vpn(vpn: &VpnConfig) -> Result<(), ValidationError> {
    if vpn.enabled && (vpn.provider.trim().is_empty() || vpn.region.trim().is_empty()) {
        let mut err = ValidationError::new("vpn");
        err.message = Some("VPN provider and region are required when VPN is enabled".into());
        return Err(err);
    }
    Ok(())
}
