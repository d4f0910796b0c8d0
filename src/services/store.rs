//! Persistent configuration store.
//!
//! Two whole documents, `config` and `services`, are read and replaced as
//! complete snapshots. Every read-modify-write in this process goes through
//! [`ConfigStore::update_config`] and serializes on one mutex.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::config::paths::PathsConfig;
use crate::models::{InstallationStatus, ServiceSelection, StackConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Document {
    Config,
    Services,
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Document::Config => f.write_str("config"),
            Document::Services => f.write_str("services"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access {document} document: {source}")]
    Io {
        document: Document,
        #[source]
        source: io::Error,
    },

    #[error("The {document} document is not valid JSON: {source}")]
    Parse {
        document: Document,
        #[source]
        source: serde_json::Error,
    },

    #[error("The {document} document is invalid: {source}")]
    Invalid {
        document: Document,
        #[source]
        source: ValidationErrors,
    },

    #[error("Installation already in progress")]
    InstallInProgress,
}

/// Raw storage for serialized documents
pub trait DocumentBackend: Send + Sync {
    /// `Ok(None)` when the document has never been written
    fn read(&self, document: Document) -> io::Result<Option<String>>;

    /// Replace the whole document
    fn write(&self, document: Document, contents: &str) -> io::Result<()>;
}

/// JSON files on disk, replaced via write-then-rename
pub struct FileBackend {
    config_path: PathBuf,
    services_path: PathBuf,
}

impl FileBackend {
    pub fn new(config_path: impl Into<PathBuf>, services_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            services_path: services_path.into(),
        }
    }

    pub fn from_paths(paths: &PathsConfig) -> Self {
        Self::new(paths.config_file(), paths.services_file())
    }

    fn path(&self, document: Document) -> &PathBuf {
        match document {
            Document::Config => &self.config_path,
            Document::Services => &self.services_path,
        }
    }
}

impl DocumentBackend for FileBackend {
    fn read(&self, document: Document) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.path(document)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, document: Document, contents: &str) -> io::Result<()> {
        let path = self.path(document);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, path)
    }
}

/// Process-local backend used by tests
#[derive(Default)]
pub struct MemoryBackend {
    documents: RwLock<HashMap<Document, String>>,
}

impl DocumentBackend for MemoryBackend {
    fn read(&self, document: Document) -> io::Result<Option<String>> {
        Ok(self.documents.read().get(&document).cloned())
    }

    fn write(&self, document: Document, contents: &str) -> io::Result<()> {
        self.documents
            .write()
            .insert(document, contents.to_string());
        Ok(())
    }
}

/// Typed access to the configuration and service-selection documents
#[derive(Clone)]
pub struct ConfigStore {
    backend: Arc<dyn DocumentBackend>,
    write_lock: Arc<Mutex<()>>,
}

impl ConfigStore {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            backend,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn file(paths: &PathsConfig) -> Self {
        Self::new(Arc::new(FileBackend::from_paths(paths)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::default()))
    }

    /// Write default documents for any that do not exist yet
    pub fn seed_defaults(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();

        if self.read_raw(Document::Config)?.is_none() {
            tracing::info!("Seeding default configuration document");
            self.write_doc(Document::Config, &StackConfig::default())?;
        }
        if self.read_raw(Document::Services)?.is_none() {
            tracing::info!("Seeding default services document");
            self.write_doc(Document::Services, &ServiceSelection::default())?;
        }
        Ok(())
    }

    pub fn load_config(&self) -> Result<StackConfig, StoreError> {
        let config: StackConfig = self
            .read_doc(Document::Config)?
            .unwrap_or_default();
        config.validate().map_err(|source| StoreError::Invalid {
            document: Document::Config,
            source,
        })?;
        Ok(config)
    }

    /// Replace the user-editable part of the configuration.
    ///
    /// The stored `installation_status` is kept; only the orchestrator moves it.
    pub fn replace_config(&self, incoming: StackConfig) -> Result<StackConfig, StoreError> {
        validate_config(&incoming)?;
        self.update_config(move |current| {
            let status = current.installation_status;
            *current = incoming;
            current.installation_status = status;
        })
    }

    /// Read-modify-write of the whole configuration document
    pub fn update_config<F>(&self, f: F) -> Result<StackConfig, StoreError>
    where
        F: FnOnce(&mut StackConfig),
    {
        let _guard = self.write_lock.lock();
        let mut config = self.load_config()?;
        f(&mut config);
        self.write_doc(Document::Config, &config)?;
        Ok(config)
    }

    pub fn set_status(&self, status: InstallationStatus) -> Result<StackConfig, StoreError> {
        self.update_config(|config| config.installation_status = status)
    }

    /// Move the status to `in_progress` unless a run already holds it.
    ///
    /// Returns the configuration snapshot the new run should use.
    pub fn begin_install(&self) -> Result<StackConfig, StoreError> {
        let _guard = self.write_lock.lock();
        let mut config = self.load_config()?;
        if config.installation_status == InstallationStatus::InProgress {
            return Err(StoreError::InstallInProgress);
        }
        config.installation_status = InstallationStatus::InProgress;
        self.write_doc(Document::Config, &config)?;
        Ok(config)
    }

    /// Flip a stale `in_progress` left by a dead process to `failed`.
    ///
    /// Returns whether anything was changed.
    pub fn recover_interrupted(&self) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock();
        let mut config = self.load_config()?;
        if config.installation_status != InstallationStatus::InProgress {
            return Ok(false);
        }
        config.installation_status = InstallationStatus::Failed;
        self.write_doc(Document::Config, &config)?;
        Ok(true)
    }

    pub fn load_services(&self) -> Result<ServiceSelection, StoreError> {
        Ok(self.read_doc(Document::Services)?.unwrap_or_default())
    }

    pub fn save_services(&self, services: &ServiceSelection) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        self.write_doc(Document::Services, services)
    }

    fn read_raw(&self, document: Document) -> Result<Option<String>, StoreError> {
        self.backend
            .read(document)
            .map_err(|source| StoreError::Io { document, source })
    }

    fn read_doc<T: DeserializeOwned>(&self, document: Document) -> Result<Option<T>, StoreError> {
        match self.read_raw(document)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| StoreError::Parse { document, source }),
            None => Ok(None),
        }
    }

    fn write_doc<T: Serialize>(&self, document: Document, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|source| StoreError::Parse { document, source })?;
        self.backend
            .write(document, &json)
            .map_err(|source| StoreError::Io { document, source })
    }
}

fn validate_config(config: &StackConfig) -> Result<(), StoreError> {
    config.validate().map_err(|source| StoreError::Invalid {
        document: Document::Config,
        source,
    })
}
