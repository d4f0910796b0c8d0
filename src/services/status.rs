use super::docker::DockerClient;
use super::install_log::RunId;
use super::store::{ConfigStore, StoreError};
use crate::models::container::error_sentinel;
use crate::models::{
    ContainerEntry, ContainerMap, ContainerRecord, ContainerState, PortMapping, StatusReport,
};

/// Joins the persisted installation status with the live container list.
///
/// The two are reported side by side and never reconciled.
#[derive(Clone)]
pub struct StatusReporter {
    store: ConfigStore,
    docker: DockerClient,
}

impl StatusReporter {
    pub fn new(store: ConfigStore, docker: DockerClient) -> Self {
        Self { store, docker }
    }

    pub async fn report(&self, active_run: Option<RunId>) -> Result<StatusReport, StoreError> {
        let config = self.store.load_config()?;
        Ok(StatusReport {
            installation_status: config.installation_status,
            run_id: active_run.map(|run| run.to_string()),
            containers: self.containers().await,
        })
    }

    /// Live containers, or the sentinel record when the runtime cannot be queried
    pub async fn containers(&self) -> ContainerMap {
        match self.docker.list_containers().await {
            Ok(listing) => parse_container_list(&listing),
            Err(e) => {
                tracing::warn!("Failed to query container status: {:#}", e);
                error_sentinel(format!("{:#}", e))
            }
        }
    }
}

/// Parse `docker ps` output in `name|status|ports` form
pub fn parse_container_list(listing: &str) -> ContainerMap {
    let mut containers = ContainerMap::new();

    for line in listing.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let mut fields = line.splitn(3, '|');
        let name = fields.next().unwrap_or_default().trim();
        if name.is_empty() {
            continue;
        }
        let status = fields.next().unwrap_or_default();
        let ports = fields.next().unwrap_or_default();

        let state = if status.contains("Up") {
            ContainerState::Running
        } else {
            ContainerState::Stopped
        };

        containers.insert(
            name.to_string(),
            ContainerEntry::Container(ContainerRecord {
                status: state,
                ports: parse_ports(ports),
            }),
        );
    }

    containers
}

/// Accepts `0.0.0.0:8080->8080/tcp` and bare `8080:8080` entries
fn parse_ports(column: &str) -> Vec<PortMapping> {
    let mut ports: Vec<PortMapping> = Vec::new();

    for entry in column.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (host, container) = match entry.split_once("->") {
            Some((published, target)) => {
                let host = published.rsplit(':').next().unwrap_or(published);
                (host, target)
            }
            None => match entry.rsplit_once(':') {
                Some(pair) => pair,
                None => continue,
            },
        };

        let container = container.split('/').next().unwrap_or(container);
        let (Ok(host), Ok(container)) = (
            host.trim().parse::<u16>(),
            container.trim().parse::<u16>(),
        ) else {
            continue;
        };

        let mapping = PortMapping { host, container };
        if !ports.contains(&mapping) {
            ports.push(mapping);
        }
    }

    ports
}
