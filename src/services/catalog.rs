//! Built-in registry of every app the stack can deploy.

use serde::Serialize;

/// Selection group an app belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AppCategory {
    ArrApps,
    DownloadClients,
    MediaServers,
    Utilities,
}

/// Host paths an app gets mounted besides its own config directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mount {
    Media,
    Downloads,
    Watch,
    DockerSocket,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppDefinition {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub image: &'static str,
    pub category: AppCategory,
    /// (host, container) pairs
    pub ports: &'static [(u16, u16)],
    pub mounts: &'static [Mount],
    pub environment: &'static [(&'static str, &'static str)],
    /// Routed through the VPN container when the VPN is enabled
    pub vpn_routed: bool,
}

const MEDIA_AND_DOWNLOADS: &[Mount] = &[Mount::Media, Mount::Downloads];

pub static APPS: &[AppDefinition] = &[
    // Arr apps
    AppDefinition {
        name: "sonarr",
        display_name: "Sonarr",
        description: "TV series management",
        image: "lscr.io/linuxserver/sonarr:latest",
        category: AppCategory::ArrApps,
        ports: &[(8989, 8989)],
        mounts: MEDIA_AND_DOWNLOADS,
        environment: &[],
        vpn_routed: false,
    },
    AppDefinition {
        name: "radarr",
        display_name: "Radarr",
        description: "Movie management",
        image: "lscr.io/linuxserver/radarr:latest",
        category: AppCategory::ArrApps,
        ports: &[(7878, 7878)],
        mounts: MEDIA_AND_DOWNLOADS,
        environment: &[],
        vpn_routed: false,
    },
    AppDefinition {
        name: "prowlarr",
        display_name: "Prowlarr",
        description: "Indexer manager for the arr apps",
        image: "lscr.io/linuxserver/prowlarr:latest",
        category: AppCategory::ArrApps,
        ports: &[(9696, 9696)],
        mounts: &[],
        environment: &[],
        vpn_routed: false,
    },
    AppDefinition {
        name: "lidarr",
        display_name: "Lidarr",
        description: "Music management",
        image: "lscr.io/linuxserver/lidarr:latest",
        category: AppCategory::ArrApps,
        ports: &[(8686, 8686)],
        mounts: MEDIA_AND_DOWNLOADS,
        environment: &[],
        vpn_routed: false,
    },
    AppDefinition {
        name: "readarr",
        display_name: "Readarr",
        description: "Book and audiobook management",
        image: "lscr.io/linuxserver/readarr:develop",
        category: AppCategory::ArrApps,
        ports: &[(8787, 8787)],
        mounts: MEDIA_AND_DOWNLOADS,
        environment: &[],
        vpn_routed: false,
    },
    AppDefinition {
        name: "bazarr",
        display_name: "Bazarr",
        description: "Subtitle management",
        image: "lscr.io/linuxserver/bazarr:latest",
        category: AppCategory::ArrApps,
        ports: &[(6767, 6767)],
        mounts: &[Mount::Media],
        environment: &[],
        vpn_routed: false,
    },
    // Download clients
    AppDefinition {
        name: "transmission",
        display_name: "Transmission",
        description: "BitTorrent client",
        image: "lscr.io/linuxserver/transmission:latest",
        category: AppCategory::DownloadClients,
        ports: &[(9091, 9091), (51413, 51413)],
        mounts: &[Mount::Downloads, Mount::Watch],
        environment: &[],
        vpn_routed: true,
    },
    AppDefinition {
        name: "qbittorrent",
        display_name: "qBittorrent",
        description: "BitTorrent client",
        image: "lscr.io/linuxserver/qbittorrent:latest",
        category: AppCategory::DownloadClients,
        ports: &[(8081, 8081), (6881, 6881)],
        mounts: &[Mount::Downloads],
        environment: &[("WEBUI_PORT", "8081")],
        vpn_routed: true,
    },
    AppDefinition {
        name: "nzbget",
        display_name: "NZBGet",
        description: "Usenet downloader",
        image: "lscr.io/linuxserver/nzbget:latest",
        category: AppCategory::DownloadClients,
        ports: &[(6789, 6789)],
        mounts: &[Mount::Downloads],
        environment: &[],
        vpn_routed: true,
    },
    AppDefinition {
        name: "sabnzbd",
        display_name: "SABnzbd",
        description: "Usenet downloader",
        image: "lscr.io/linuxserver/sabnzbd:latest",
        category: AppCategory::DownloadClients,
        ports: &[(8085, 8080)],
        mounts: &[Mount::Downloads],
        environment: &[],
        vpn_routed: true,
    },
    AppDefinition {
        name: "jdownloader",
        display_name: "JDownloader",
        description: "Direct download manager",
        image: "jlesage/jdownloader-2:latest",
        category: AppCategory::DownloadClients,
        ports: &[(5800, 5800)],
        mounts: &[Mount::Downloads],
        environment: &[],
        vpn_routed: true,
    },
    // Media servers
    AppDefinition {
        name: "jellyfin",
        display_name: "Jellyfin",
        description: "Free software media server",
        image: "lscr.io/linuxserver/jellyfin:latest",
        category: AppCategory::MediaServers,
        ports: &[(8096, 8096)],
        mounts: &[Mount::Media],
        environment: &[],
        vpn_routed: false,
    },
    AppDefinition {
        name: "plex",
        display_name: "Plex",
        description: "Plex media server",
        image: "lscr.io/linuxserver/plex:latest",
        category: AppCategory::MediaServers,
        ports: &[(32400, 32400)],
        mounts: &[Mount::Media],
        environment: &[("VERSION", "docker")],
        vpn_routed: false,
    },
    AppDefinition {
        name: "emby",
        display_name: "Emby",
        description: "Emby media server",
        image: "lscr.io/linuxserver/emby:latest",
        category: AppCategory::MediaServers,
        ports: &[(8096, 8096)],
        mounts: &[Mount::Media],
        environment: &[],
        vpn_routed: false,
    },
    // Utilities
    AppDefinition {
        name: "heimdall",
        display_name: "Heimdall",
        description: "Application dashboard",
        image: "lscr.io/linuxserver/heimdall:latest",
        category: AppCategory::Utilities,
        ports: &[(8090, 80)],
        mounts: &[],
        environment: &[],
        vpn_routed: false,
    },
    AppDefinition {
        name: "overseerr",
        display_name: "Overseerr",
        description: "Media request management",
        image: "lscr.io/linuxserver/overseerr:latest",
        category: AppCategory::Utilities,
        ports: &[(5055, 5055)],
        mounts: &[],
        environment: &[],
        vpn_routed: false,
    },
    AppDefinition {
        name: "tautulli",
        display_name: "Tautulli",
        description: "Plex monitoring and statistics",
        image: "lscr.io/linuxserver/tautulli:latest",
        category: AppCategory::Utilities,
        ports: &[(8181, 8181)],
        mounts: &[],
        environment: &[],
        vpn_routed: false,
    },
    AppDefinition {
        name: "portainer",
        display_name: "Portainer",
        description: "Container management UI",
        image: "portainer/portainer-ce:latest",
        category: AppCategory::Utilities,
        ports: &[(9000, 9000)],
        mounts: &[Mount::DockerSocket],
        environment: &[],
        vpn_routed: false,
    },
    AppDefinition {
        name: "nginx_proxy_manager",
        display_name: "Nginx Proxy Manager",
        description: "Reverse proxy with a web UI",
        image: "jc21/nginx-proxy-manager:latest",
        category: AppCategory::Utilities,
        ports: &[(80, 80), (81, 81), (443, 443)],
        mounts: &[],
        environment: &[],
        vpn_routed: false,
    },
    AppDefinition {
        name: "get_iplayer",
        display_name: "get_iplayer",
        description: "BBC iPlayer downloader",
        image: "ghcr.io/thespad/get_iplayer:latest",
        category: AppCategory::Utilities,
        ports: &[(1935, 1935)],
        mounts: &[Mount::Downloads],
        environment: &[],
        vpn_routed: true,
    },
];

/// Look up an app by its service-selection key
pub fn find(name: &str) -> Option<&'static AppDefinition> {
    APPS.iter().find(|app| app.name == name)
}
