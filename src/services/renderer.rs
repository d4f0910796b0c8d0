//! Service selection to compose manifest.
//!
//! Two renderers exist: [`ScriptRenderer`] drives the external
//! `generate-compose.sh`, [`BuiltinRenderer`] writes the manifest itself.
//! Both derive their choices from [`ComposeArgs`].

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::catalog::{self, AppDefinition, Mount};
use super::env_file::{CONTAINER_NETWORK, VPN_CONTAINER, VPN_IMAGE};
use super::runner::{CommandRunner, CommandSpec};
use crate::models::{ServiceSelection, StackConfig};

const SCRIPT_TIMEOUT: Duration = Duration::from_secs(120);

/// Outcome of a render, returned verbatim by `/api/generate-compose`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct RenderResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RenderResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait ManifestRenderer: Send + Sync {
    async fn render(&self, config: &StackConfig, services: &ServiceSelection) -> RenderResult;
}

/// What goes into the manifest after the selection tie-breaks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeArgs {
    pub arr_apps: Vec<&'static str>,
    pub media_server: Option<&'static str>,
    pub torrent_client: Option<&'static str>,
    pub usenet_client: Option<&'static str>,
    pub direct_download: bool,
    pub dashboard: bool,
    pub requests: bool,
    pub monitoring: bool,
    pub proxy: bool,
    pub portainer: bool,
    pub get_iplayer: bool,
}

impl ComposeArgs {
    pub fn from_selection(services: &ServiceSelection) -> Self {
        let media = &services.media_servers;
        let downloads = &services.download_clients;
        let utilities = &services.utilities;

        Self {
            arr_apps: services.arr_apps.enabled().collect(),
            media_server: first_enabled(&[
                (media.jellyfin, "jellyfin"),
                (media.plex, "plex"),
                (media.emby, "emby"),
            ]),
            torrent_client: first_enabled(&[
                (downloads.transmission, "transmission"),
                (downloads.qbittorrent, "qbittorrent"),
            ]),
            usenet_client: first_enabled(&[
                (downloads.nzbget, "nzbget"),
                (downloads.sabnzbd, "sabnzbd"),
            ]),
            direct_download: downloads.jdownloader,
            dashboard: utilities.heimdall,
            requests: utilities.overseerr,
            monitoring: utilities.tautulli,
            proxy: utilities.nginx_proxy_manager,
            portainer: utilities.portainer,
            get_iplayer: utilities.get_iplayer,
        }
    }

    /// Command-line flags for `generate-compose.sh`
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if !self.arr_apps.is_empty() {
            args.push("--arr-apps".to_string());
        }
        let choices = [
            ("--media-server", self.media_server),
            ("--torrent-client", self.torrent_client),
            ("--usenet-client", self.usenet_client),
        ];
        for (flag, choice) in choices {
            if let Some(name) = choice {
                args.push(flag.to_string());
                args.push(name.to_string());
            }
        }
        let switches = [
            ("--direct-download", self.direct_download),
            ("--dashboard", self.dashboard),
            ("--requests", self.requests),
            ("--monitoring", self.monitoring),
            ("--proxy", self.proxy),
        ];
        for (flag, on) in switches {
            if on {
                args.push(flag.to_string());
            }
        }
        args
    }

    /// Every app the manifest will contain, in manifest order
    pub fn apps(&self) -> Vec<&'static str> {
        let mut apps = self.arr_apps.clone();
        apps.extend(self.media_server);
        apps.extend(self.torrent_client);
        apps.extend(self.usenet_client);
        let flagged = [
            ("jdownloader", self.direct_download),
            ("heimdall", self.dashboard),
            ("overseerr", self.requests),
            ("tautulli", self.monitoring),
            ("nginx_proxy_manager", self.proxy),
            ("portainer", self.portainer),
            ("get_iplayer", self.get_iplayer),
        ];
        apps.extend(flagged.into_iter().filter(|(_, on)| *on).map(|(name, _)| name));
        apps
    }
}

fn first_enabled(options: &[(bool, &'static str)]) -> Option<&'static str> {
    options.iter().find(|(on, _)| *on).map(|(_, name)| *name)
}

// ============================================================================
// External generator script
// ============================================================================

pub struct ScriptRenderer {
    runner: Arc<dyn CommandRunner>,
    script: PathBuf,
    base_dir: PathBuf,
}

impl ScriptRenderer {
    pub fn new(runner: Arc<dyn CommandRunner>, script: PathBuf, base_dir: PathBuf) -> Self {
        Self {
            runner,
            script,
            base_dir,
        }
    }
}

#[async_trait]
impl ManifestRenderer for ScriptRenderer {
    async fn render(&self, _config: &StackConfig, services: &ServiceSelection) -> RenderResult {
        let spec = CommandSpec::new(self.script.display().to_string())
            .args(ComposeArgs::from_selection(services).to_args())
            .current_dir(&self.base_dir);

        match self.runner.run(&spec, SCRIPT_TIMEOUT).await {
            Ok(output) if output.success => RenderResult::ok(output.stdout),
            Ok(output) => RenderResult::failed(output.stderr),
            Err(e) => RenderResult::failed(e.to_string()),
        }
    }
}

// ============================================================================
// In-process renderer
// ============================================================================

#[derive(Debug, Serialize)]
struct ComposeFile {
    services: BTreeMap<String, ComposeService>,
    networks: BTreeMap<String, ComposeNetwork>,
}

#[derive(Debug, Default, Serialize)]
struct ComposeService {
    image: String,
    container_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    network_mode: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    networks: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cap_add: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    devices: Vec<String>,
    environment: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    volumes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ports: Vec<String>,
    restart: String,
}

#[derive(Debug, Serialize)]
struct ComposeNetwork {
    driver: String,
}

/// Writes the compose manifest without the external generator
pub struct BuiltinRenderer {
    manifest_path: PathBuf,
}

impl BuiltinRenderer {
    pub fn new(manifest_path: PathBuf) -> Self {
        Self { manifest_path }
    }

    /// YAML manifest for `args`; values are `${VAR}` references into `.env`
    pub fn render_manifest(
        config: &StackConfig,
        args: &ComposeArgs,
    ) -> Result<String, serde_yaml::Error> {
        let mut services = BTreeMap::new();
        let vpn = config.vpn.enabled;

        let mut vpn_ports = Vec::new();
        for app in args.apps().into_iter().filter_map(catalog::find) {
            let routed = vpn && app.vpn_routed;
            let mut service = app_service(app);
            if routed {
                vpn_ports.append(&mut service.ports);
                service.network_mode = Some(format!("service:{}", VPN_CONTAINER));
                service.depends_on = vec![VPN_CONTAINER.to_string()];
            } else {
                service.networks = vec![CONTAINER_NETWORK.to_string()];
            }
            services.insert(app.name.to_string(), service);
        }

        if vpn {
            services.insert(VPN_CONTAINER.to_string(), vpn_service(vpn_ports));
        }

        let mut networks = BTreeMap::new();
        networks.insert(
            CONTAINER_NETWORK.to_string(),
            ComposeNetwork {
                driver: "bridge".to_string(),
            },
        );

        serde_yaml::to_string(&ComposeFile { services, networks })
    }
}

#[async_trait]
impl ManifestRenderer for BuiltinRenderer {
    async fn render(&self, config: &StackConfig, services: &ServiceSelection) -> RenderResult {
        let args = ComposeArgs::from_selection(services);
        let manifest = match Self::render_manifest(config, &args) {
            Ok(manifest) => manifest,
            Err(e) => return RenderResult::failed(format!("Failed to render manifest: {}", e)),
        };

        if let Some(parent) = self.manifest_path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                return RenderResult::failed(format!("Failed to create {}: {}", parent.display(), e));
            }
        }
        match std::fs::write(&self.manifest_path, manifest) {
            Ok(()) => RenderResult::ok(format!(
                "Generated {} with services: {}",
                self.manifest_path.display(),
                args.apps().join(", ")
            )),
            Err(e) => RenderResult::failed(format!(
                "Failed to write {}: {}",
                self.manifest_path.display(),
                e
            )),
        }
    }
}

fn app_service(app: &AppDefinition) -> ComposeService {
    let mut environment = BTreeMap::new();
    environment.insert("PUID".to_string(), "${PUID}".to_string());
    environment.insert("PGID".to_string(), "${PGID}".to_string());
    environment.insert("TZ".to_string(), "${TIMEZONE}".to_string());
    for (key, value) in app.environment {
        environment.insert(key.to_string(), value.to_string());
    }

    let mut volumes = vec![format!("${{DOCKER_DIR}}/{}:/config", app.name)];
    volumes.extend(app.mounts.iter().map(|mount| {
        match mount {
            Mount::Media => "${MEDIA_DIR}:/media",
            Mount::Downloads => "${DOWNLOADS_DIR}:/downloads",
            Mount::Watch => "${WATCH_DIR}:/watch",
            Mount::DockerSocket => "/var/run/docker.sock:/var/run/docker.sock",
        }
        .to_string()
    }));

    ComposeService {
        image: app.image.to_string(),
        container_name: app.name.to_string(),
        environment,
        volumes,
        ports: app
            .ports
            .iter()
            .map(|(host, container)| format!("{}:{}", host, container))
            .collect(),
        restart: "unless-stopped".to_string(),
        ..ComposeService::default()
    }
}

fn vpn_service(ports: Vec<String>) -> ComposeService {
    let environment = [
        ("VPN_SERVICE_PROVIDER", "${VPN_SERVICE_PROVIDER}"),
        ("OPENVPN_USER", "${OPENVPN_USER}"),
        ("OPENVPN_PASSWORD", "${OPENVPN_PASSWORD}"),
        ("SERVER_REGIONS", "${SERVER_REGIONS}"),
        ("TZ", "${TIMEZONE}"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    ComposeService {
        image: VPN_IMAGE.to_string(),
        container_name: VPN_CONTAINER.to_string(),
        networks: vec![CONTAINER_NETWORK.to_string()],
        cap_add: vec!["NET_ADMIN".to_string()],
        devices: vec!["/dev/net/tun:/dev/net/tun".to_string()],
        environment,
        volumes: vec![format!("${{DOCKER_DIR}}/{}:/gluetun", VPN_CONTAINER)],
        ports,
        restart: "unless-stopped".to_string(),
        ..ComposeService::default()
    }
}
