//! Descriptive host facts. Every probe falls back to a default instead of failing.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use super::docker::DockerClient;
use super::runner::{run_checked, CommandRunner, CommandSpec};
use super::store::ConfigStore;
use crate::models::{Drive, OsInfo, RaspberryPiInfo, SystemInfo, TranscodingInfo};

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct SystemInspector {
    runner: Arc<dyn CommandRunner>,
    docker: DockerClient,
    store: ConfigStore,
}

impl SystemInspector {
    pub fn new(runner: Arc<dyn CommandRunner>, docker: DockerClient, store: ConfigStore) -> Self {
        Self {
            runner,
            docker,
            store,
        }
    }

    pub async fn inspect(&self) -> SystemInfo {
        let (memory_total, memory_available) = read_file("/proc/meminfo")
            .map(|s| parse_meminfo(&s))
            .unwrap_or_default();
        let (disk_total, disk_free) = self.disk_usage().await.unwrap_or_default();
        let docker_version = self.docker.version().await;
        let tailscale_ip = self.tailscale_ip().await;
        let tailscale_installed = tailscale_ip.is_some() || self.tailscale_present().await;

        let installation_status = match self.store.load_config() {
            Ok(config) => config.installation_status,
            Err(e) => {
                tracing::warn!("Failed to read installation status: {}", e);
                Default::default()
            }
        };

        SystemInfo {
            hostname: hostname(),
            os: read_file("/etc/os-release")
                .map(|s| parse_os_release(&s))
                .unwrap_or_default(),
            architecture: std::env::consts::ARCH.to_string(),
            cpu_cores: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            memory_total,
            memory_available,
            disk_total,
            disk_free,
            docker_installed: docker_version.is_some(),
            docker_version,
            tailscale_installed,
            tailscale_ip,
            raspberry_pi: raspberry_pi(),
            transcoding: TranscodingInfo::new(
                Path::new("/dev/dri").exists(),
                Path::new("/dev/nvidia0").exists(),
                Path::new("/dev/video10").exists(),
            ),
            installation_status,
        }
    }

    /// Mountable partitions; empty when lsblk is unavailable
    pub async fn drives(&self) -> Vec<Drive> {
        let json = CommandSpec::new("lsblk").args(["-o", "NAME,SIZE,TYPE,FSTYPE", "-J"]);
        match run_checked(self.runner.as_ref(), &json, PROBE_TIMEOUT).await {
            Ok(output) => match parse_lsblk_json(&output.stdout) {
                Ok(drives) => return drives,
                Err(e) => tracing::warn!("Unexpected lsblk JSON output: {}", e),
            },
            Err(e) => tracing::warn!("lsblk JSON listing failed: {:#}", e),
        }

        let text = CommandSpec::new("lsblk").args(["-o", "NAME,SIZE,TYPE,FSTYPE"]);
        match run_checked(self.runner.as_ref(), &text, PROBE_TIMEOUT).await {
            Ok(output) => parse_lsblk_text(&output.stdout),
            Err(e) => {
                tracing::warn!("Drive detection failed: {:#}", e);
                Vec::new()
            }
        }
    }

    async fn disk_usage(&self) -> Option<(u64, u64)> {
        let spec = CommandSpec::new("df").args(["-B1", "/"]);
        let output = run_checked(self.runner.as_ref(), &spec, PROBE_TIMEOUT)
            .await
            .ok()?;
        parse_df(&output.stdout)
    }

    async fn tailscale_ip(&self) -> Option<String> {
        let spec = CommandSpec::new("tailscale").args(["ip", "-4"]);
        let output = run_checked(self.runner.as_ref(), &spec, PROBE_TIMEOUT)
            .await
            .ok()?;
        output
            .stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string)
    }

    async fn tailscale_present(&self) -> bool {
        let spec = CommandSpec::new("tailscale").arg("version");
        run_checked(self.runner.as_ref(), &spec, PROBE_TIMEOUT)
            .await
            .is_ok()
    }
}

fn read_file(path: &str) -> Option<String> {
    std::fs::read_to_string(path).ok()
}

fn hostname() -> String {
    ["/proc/sys/kernel/hostname", "/etc/hostname"]
        .into_iter()
        .filter_map(read_file)
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn raspberry_pi() -> RaspberryPiInfo {
    let model = read_file("/proc/device-tree/model")
        .map(|s| s.trim_end_matches('\0').trim().to_string())
        .unwrap_or_default();
    RaspberryPiInfo {
        is_raspberry_pi: model.contains("Raspberry Pi"),
        model,
    }
}

pub fn parse_os_release(contents: &str) -> OsInfo {
    let mut info = OsInfo::default();
    for line in contents.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').to_string();
        match key.trim() {
            "NAME" => info.name = value,
            "VERSION_ID" => info.version = value,
            "PRETTY_NAME" => info.pretty_name = value,
            "ID" => info.id = value,
            _ => {}
        }
    }
    info
}

/// (total, available) in bytes
pub fn parse_meminfo(contents: &str) -> (u64, u64) {
    let field = |name: &str| {
        contents
            .lines()
            .find_map(|line| line.strip_prefix(name))
            .and_then(|rest| rest.trim_start_matches(':').split_whitespace().next())
            .and_then(|kb| kb.parse::<u64>().ok())
            .map(|kb| kb * 1024)
            .unwrap_or(0)
    };
    (field("MemTotal"), field("MemAvailable"))
}

/// (total, free) from `df -B1` output
pub fn parse_df(output: &str) -> Option<(u64, u64)> {
    let line = output.lines().nth(1)?;
    let columns: Vec<&str> = line.split_whitespace().collect();
    let total = columns.get(1)?.parse().ok()?;
    let free = columns.get(3)?.parse().ok()?;
    Some((total, free))
}

#[derive(Debug, Deserialize)]
struct LsblkOutput {
    #[serde(default)]
    blockdevices: Vec<BlockDevice>,
}

#[derive(Debug, Deserialize)]
struct BlockDevice {
    name: String,
    size: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    fstype: Option<String>,
    #[serde(default)]
    children: Vec<BlockDevice>,
}

/// Partitions of disks carrying a filesystem other than swap
pub fn parse_lsblk_json(output: &str) -> Result<Vec<Drive>, serde_json::Error> {
    let listing: LsblkOutput = serde_json::from_str(output)?;
    let drives = listing
        .blockdevices
        .iter()
        .filter(|device| device.kind.as_deref() == Some("disk"))
        .flat_map(|disk| disk.children.iter())
        .filter(|part| part.kind.as_deref() == Some("part"))
        .filter_map(|part| {
            let fstype = part.fstype.as_deref().filter(|f| !f.is_empty() && *f != "swap")?;
            Some(Drive {
                device: format!("/dev/{}", part.name),
                size: part.size.clone().unwrap_or_default(),
                fs_type: fstype.to_string(),
            })
        })
        .collect();
    Ok(drives)
}

/// Fallback for lsblk builds without JSON output
pub fn parse_lsblk_text(output: &str) -> Vec<Drive> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 4 || parts[2] != "part" || parts[3] == "swap" {
                return None;
            }
            let name = parts[0].trim_start_matches(['├', '└', '─', '│', '|', '`', '-']);
            Some(Drive {
                device: format!("/dev/{}", name),
                size: parts[1].to_string(),
                fs_type: parts[3].to_string(),
            })
        })
        .collect()
}
