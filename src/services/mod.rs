pub mod catalog;
pub mod docker;
pub mod env_file;
pub mod host;
pub mod install_log;
pub mod orchestrator;
pub mod renderer;
pub mod retry;
pub mod runner;
pub mod status;
pub mod store;
pub mod supervisor;
pub mod system;

pub use docker::DockerClient;
pub use host::HostInstaller;
pub use install_log::{InstallLog, RunId, RunJournal};
pub use orchestrator::Orchestrator;
pub use renderer::{BuiltinRenderer, ManifestRenderer, ScriptRenderer};
pub use runner::{CommandRunner, SystemRunner};
pub use status::StatusReporter;
pub use store::ConfigStore;
pub use supervisor::InstallSupervisor;
pub use system::SystemInspector;
