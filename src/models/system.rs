use serde::{Deserialize, Serialize};

use super::config::InstallationStatus;

/// Descriptive host facts shown on the dashboard
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SystemInfo {
    pub hostname: String,
    pub os: OsInfo,
    pub architecture: String,
    pub cpu_cores: usize,
    pub memory_total: u64,
    pub memory_available: u64,
    pub disk_total: u64,
    pub disk_free: u64,
    pub docker_installed: bool,
    pub docker_version: Option<String>,
    pub tailscale_installed: bool,
    pub tailscale_ip: Option<String>,
    pub raspberry_pi: RaspberryPiInfo,
    pub transcoding: TranscodingInfo,
    pub installation_status: InstallationStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct OsInfo {
    pub name: String,
    pub version: String,
    pub pretty_name: String,
    pub id: String,
}

impl Default for OsInfo {
    fn default() -> Self {
        Self {
            name: "Linux".to_string(),
            version: "unknown".to_string(),
            pretty_name: "Linux".to_string(),
            id: "linux".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct RaspberryPiInfo {
    pub is_raspberry_pi: bool,
    pub model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TranscodeMethod {
    V4l2,
    Nvdec,
    Vaapi,
    Software,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct TranscodingInfo {
    pub vaapi_available: bool,
    pub nvdec_available: bool,
    pub v4l2_available: bool,
    pub recommended_method: TranscodeMethod,
}

impl TranscodingInfo {
    pub fn new(vaapi: bool, nvdec: bool, v4l2: bool) -> Self {
        let recommended_method = if v4l2 {
            TranscodeMethod::V4l2
        } else if nvdec {
            TranscodeMethod::Nvdec
        } else if vaapi {
            TranscodeMethod::Vaapi
        } else {
            TranscodeMethod::Software
        };
        Self {
            vaapi_available: vaapi,
            nvdec_available: nvdec,
            v4l2_available: v4l2,
            recommended_method,
        }
    }
}

/// A mountable partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Drive {
    pub device: String,
    pub size: String,
    #[serde(rename = "type")]
    pub fs_type: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DrivesResponse {
    pub drives: Vec<Drive>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcoding_preference_order() {
        assert_eq!(
            TranscodingInfo::new(true, true, true).recommended_method,
            TranscodeMethod::V4l2
        );
        assert_eq!(
            TranscodingInfo::new(true, true, false).recommended_method,
            TranscodeMethod::Nvdec
        );
        assert_eq!(
            TranscodingInfo::new(true, false, false).recommended_method,
            TranscodeMethod::Vaapi
        );
        assert_eq!(
            TranscodingInfo::new(false, false, false).recommended_method,
            TranscodeMethod::Software
        );
    }

    #[test]
    fn test_drive_serializes_type_field() {
        let drive = Drive {
            device: "/dev/sda1".to_string(),
            size: "1.8T".to_string(),
            fs_type: "ext4".to_string(),
        };
        let json = serde_json::to_value(&drive).unwrap();
        assert_eq!(json["type"], "ext4");
    }
}
