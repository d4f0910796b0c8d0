use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::config::InstallationStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Running,
    Stopped,
}

/// A published port, host side first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PortMapping {
    pub host: u16,
    pub container: u16,
}

/// Live view of one container, rebuilt from the runtime on every query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ContainerRecord {
    pub status: ContainerState,
    pub ports: Vec<PortMapping>,
}

/// Placeholder returned under the `error` key when the runtime could not be queried
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ContainerQueryError {
    /// Always `"error"`
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum ContainerEntry {
    Container(ContainerRecord),
    Error(ContainerQueryError),
}

/// Container name -> entry. Sorted so responses are stable.
pub type ContainerMap = BTreeMap<String, ContainerEntry>;

/// Key used for the sentinel record
pub const ERROR_KEY: &str = "error";

pub fn error_sentinel(message: impl Into<String>) -> ContainerMap {
    let mut map = ContainerMap::new();
    map.insert(
        ERROR_KEY.to_string(),
        ContainerEntry::Error(ContainerQueryError {
            status: "error".to_string(),
            message: message.into(),
        }),
    );
    map
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct StatusReport {
    pub installation_status: InstallationStatus,
    /// Id of the run currently in flight in this process, if any
    pub run_id: Option<String>,
    #[schema(value_type = Object)]
    pub containers: ContainerMap,
}
