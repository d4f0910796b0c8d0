use std::sync::Arc;

use crate::config::paths::PathsConfig;
use crate::services::{
    CommandRunner, ConfigStore, DockerClient, HostInstaller, InstallLog, InstallSupervisor,
    ManifestRenderer, Orchestrator, StatusReporter, SystemInspector,
};

/// Application state containing all shared resources
#[derive(Clone)]
pub struct AppState {
    pub paths: PathsConfig,
    pub store: ConfigStore,
    pub install_log: InstallLog,
    pub docker: DockerClient,
    pub renderer: Arc<dyn ManifestRenderer>,
    pub supervisor: InstallSupervisor,
    pub status: StatusReporter,
    pub system: SystemInspector,
}

impl AppState {
    /// Wire every service around one command runner and one renderer
    pub fn new(
        paths: PathsConfig,
        store: ConfigStore,
        runner: Arc<dyn CommandRunner>,
        renderer: Arc<dyn ManifestRenderer>,
    ) -> Self {
        let install_log = InstallLog::new(paths.installation_log());
        let docker = DockerClient::new(runner.clone());
        let host = HostInstaller::new(runner.clone(), paths.work_dir());

        let orchestrator = Arc::new(Orchestrator::new(
            store.clone(),
            renderer.clone(),
            docker.clone(),
            host,
            paths.clone(),
        ));
        let supervisor = InstallSupervisor::new(store.clone(), install_log.clone(), orchestrator);

        Self {
            status: StatusReporter::new(store.clone(), docker.clone()),
            system: SystemInspector::new(runner, docker.clone(), store.clone()),
            paths,
            store,
            install_log,
            docker,
            renderer,
            supervisor,
        }
    }
}
