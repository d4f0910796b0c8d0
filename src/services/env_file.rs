//! The `.env` file consumed by the compose manifest.

use std::io;
use std::path::Path;

use crate::models::StackConfig;

pub const VPN_CONTAINER: &str = "vpn";
pub const VPN_IMAGE: &str = "qmcgaw/gluetun";
pub const CONTAINER_NETWORK: &str = "vpn_network";

pub fn render_env_file(config: &StackConfig) -> String {
    format!(
        "# Generated by PI-PVR Web Installer
# Base Configuration
PUID={puid}
PGID={pgid}
TIMEZONE={timezone}
IMAGE_RELEASE=latest
DOCKER_DIR={docker_dir}

# Media and Download Directories
MEDIA_DIR={media_dir}
DOWNLOADS_DIR={downloads_dir}
WATCH_DIR={watch_dir}

# VPN Configuration
VPN_CONTAINER={vpn_container}
VPN_IMAGE={vpn_image}
VPN_SERVICE_PROVIDER={vpn_provider}
OPENVPN_USER={vpn_user}
OPENVPN_PASSWORD={vpn_password}
SERVER_REGIONS={vpn_region}

# Tailscale
TAILSCALE_AUTH_KEY={tailscale_key}

# Network Configuration
CONTAINER_NETWORK={network}
",
        puid = config.puid,
        pgid = config.pgid,
        timezone = config.timezone,
        docker_dir = config.docker_dir,
        media_dir = config.media_dir,
        downloads_dir = config.downloads_dir,
        watch_dir = config.watch_dir(),
        vpn_container = VPN_CONTAINER,
        vpn_image = VPN_IMAGE,
        vpn_provider = config.vpn.provider,
        vpn_user = config.vpn.username,
        vpn_password = config.vpn.password,
        vpn_region = config.vpn.region,
        tailscale_key = config.tailscale.auth_key,
        network = CONTAINER_NETWORK,
    )
}

/// Render and write the environment file, replacing any previous one.
///
/// The file carries the VPN password and the Tailscale key, so it is owner-only.
pub fn write_env_file(path: &Path, config: &StackConfig) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_env_file(config))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_env_file() {
        let mut config = StackConfig {
            puid: 1001,
            pgid: 1002,
            timezone: "Europe/London".to_string(),
            media_dir: "/mnt/media".to_string(),
            downloads_dir: "/mnt/downloads".to_string(),
            docker_dir: "/home/pi/docker".to_string(),
            ..StackConfig::default()
        };
        config.vpn.username = "user".to_string();
        config.vpn.password = "secret".to_string();
        config.tailscale.auth_key = "tskey-123".to_string();

        let env = render_env_file(&config);
        let lines: Vec<&str> = env.lines().collect();

        assert_eq!(lines[0], "# Generated by PI-PVR Web Installer");
        assert!(lines.contains(&"PUID=1001"));
        assert!(lines.contains(&"PGID=1002"));
        assert!(lines.contains(&"TIMEZONE=Europe/London"));
        assert!(lines.contains(&"IMAGE_RELEASE=latest"));
        assert!(lines.contains(&"DOCKER_DIR=/home/pi/docker"));
        assert!(lines.contains(&"WATCH_DIR=/mnt/downloads/watch"));
        assert!(lines.contains(&"VPN_CONTAINER=vpn"));
        assert!(lines.contains(&"VPN_IMAGE=qmcgaw/gluetun"));
        assert!(lines.contains(&"OPENVPN_USER=user"));
        assert!(lines.contains(&"OPENVPN_PASSWORD=secret"));
        assert!(lines.contains(&"TAILSCALE_AUTH_KEY=tskey-123"));
        assert_eq!(lines.last(), Some(&"CONTAINER_NETWORK=vpn_network"));
    }

    #[test]
    fn test_write_env_file_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "STALE=1\n").unwrap();

        write_env_file(&path, &StackConfig::default()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("STALE"));
        assert!(written.starts_with("# Generated by PI-PVR Web Installer\n"));
    }

    #[cfg(unix)]
    #[test]
    fn test_write_env_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "STALE=1\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        write_env_file(&path, &StackConfig::default()).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
