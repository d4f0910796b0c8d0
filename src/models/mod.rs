pub mod config;
pub mod container;
pub mod services;
pub mod system;

pub use config::{InstallationStatus, StackConfig, TailscaleConfig, VpnConfig};
pub use container::{
    ContainerEntry, ContainerMap, ContainerQueryError, ContainerRecord, ContainerState,
    PortMapping, StatusReport,
};
pub use services::{ArrApps, DownloadClients, MediaServers, ServiceSelection, Utilities};
pub use system::{Drive, DrivesResponse, OsInfo, RaspberryPiInfo, SystemInfo, TranscodingInfo};
