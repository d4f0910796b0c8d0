use serde::{Deserialize, Serialize};

/// Which optional components the manifest should include.
///
/// Flags are independent; picking between mutually exclusive apps is the
/// renderer's job (see `ComposeArgs`).
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(deny_unknown_fields)]
pub struct ServiceSelection {
    #[serde(default)]
    pub arr_apps: ArrApps,
    #[serde(default)]
    pub download_clients: DownloadClients,
    #[serde(default)]
    pub media_servers: MediaServers,
    #[serde(default)]
    pub utilities: Utilities,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(default, deny_unknown_fields)]
pub struct ArrApps {
    pub sonarr: bool,
    pub radarr: bool,
    pub prowlarr: bool,
    pub lidarr: bool,
    pub readarr: bool,
    pub bazarr: bool,
}

impl Default for ArrApps {
    fn default() -> Self {
        Self {
            sonarr: true,
            radarr: true,
            prowlarr: true,
            lidarr: false,
            readarr: false,
            bazarr: false,
        }
    }
}

impl ArrApps {
    /// Names of the enabled arr apps, in catalogue order
    pub fn enabled(&self) -> impl Iterator<Item = &'static str> + '_ {
        [
            ("sonarr", self.sonarr),
            ("radarr", self.radarr),
            ("prowlarr", self.prowlarr),
            ("lidarr", self.lidarr),
            ("readarr", self.readarr),
            ("bazarr", self.bazarr),
        ]
        .into_iter()
        .filter_map(|(name, on)| on.then_some(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadClients {
    pub transmission: bool,
    pub qbittorrent: bool,
    pub nzbget: bool,
    pub sabnzbd: bool,
    pub jdownloader: bool,
}

impl Default for DownloadClients {
    fn default() -> Self {
        Self {
            transmission: true,
            qbittorrent: false,
            nzbget: true,
            sabnzbd: false,
            jdownloader: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(default, deny_unknown_fields)]
pub struct MediaServers {
    pub jellyfin: bool,
    pub plex: bool,
    pub emby: bool,
}

impl Default for MediaServers {
    fn default() -> Self {
        Self {
            jellyfin: true,
            plex: false,
            emby: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(default, deny_unknown_fields)]
pub struct Utilities {
    pub heimdall: bool,
    pub overseerr: bool,
    pub tautulli: bool,
    pub portainer: bool,
    pub nginx_proxy_manager: bool,
    pub get_iplayer: bool,
}

impl Default for Utilities {
    fn default() -> Self {
        Self {
            heimdall: false,
            overseerr: false,
            tautulli: false,
            portainer: true,
            nginx_proxy_manager: false,
            get_iplayer: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_selection() {
        let services = ServiceSelection::default();
        assert!(services.arr_apps.sonarr);
        assert!(services.download_clients.transmission);
        assert!(services.download_clients.nzbget);
        assert!(services.media_servers.jellyfin);
        assert!(services.utilities.portainer);
        assert!(!services.utilities.heimdall);
    }

    #[test]
    fn test_unknown_flag_rejected() {
        let json = serde_json::json!({
            "arr_apps": {"sonarr": true, "sonnar": true}
        });
        assert!(serde_json::from_value::<ServiceSelection>(json).is_err());
    }

    #[test]
    fn test_missing_flags_take_defaults() {
        let json = serde_json::json!({
            "media_servers": {"plex": true}
        });
        let services: ServiceSelection = serde_json::from_value(json).unwrap();
        assert!(services.media_servers.plex);
        assert!(services.media_servers.jellyfin);
        assert_eq!(services.arr_apps, ArrApps::default());
    }

    #[test]
    fn test_enabled_arr_apps_in_order() {
        let arr = ArrApps {
            sonarr: false,
            radarr: true,
            prowlarr: false,
            lidarr: true,
            readarr: false,
            bazarr: false,
        };
        assert_eq!(arr.enabled().collect::<Vec<_>>(), vec!["radarr", "lidarr"]);
    }
}
