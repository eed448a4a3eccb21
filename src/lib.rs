//! Site QC Core
//!
//! Layered architecture:
//! - domain: project records and inspection checklists
//! - repository: document store contract and backends
//! - store: the observable project list mirrored to a document store
//! - checklists: predefined inspection checklists and per-screen boards
//! - identity: the signed-in user
//! - config: application configuration
//!
//! [`AppContext`] is built once at startup and handed to every screen.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

pub mod checklists;
pub mod config;
pub mod domain;
pub mod identity;
pub mod repository;
pub mod store;

use config::{AppConfig, BackendConfig, ConfigError};
use identity::{IdentityProvider, SessionState};
use repository::{
    DocumentStore, FirestoreDocumentStore, MemoryDocumentStore, SqliteDocumentStore, StoreError,
};
use store::{ProjectStore, SnapshotCache};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to open document store: {0}")]
    Store(#[from] StoreError),
    #[error("failed to start logging: {0}")]
    Logger(#[from] rolling_logger::LoggerError),
}

/// Application state shared across screens
pub struct AppContext {
    pub config: AppConfig,
    pub session: Arc<SessionState>,
    pub projects: ProjectStore,
}

impl AppContext {
    /// Start logging, open the configured document store and build the
    /// project store. Projects are not loaded until [`AppContext::start`].
    pub fn bootstrap(config: AppConfig) -> Result<Self, BootstrapError> {
        init_logging(&config)?;

        let session = Arc::new(SessionState::new());
        let documents = open_documents(&config.backend, session.clone())?;
        Ok(Self::with_documents(config, session, documents))
    }

    /// Load the JSON config at `path` (defaults when absent) and bootstrap
    pub fn from_config_file(path: &Path) -> Result<Self, BootstrapError> {
        Self::bootstrap(AppConfig::load_or_default(path)?)
    }

    /// Build around an already opened document store
    pub fn with_documents(
        config: AppConfig,
        session: Arc<SessionState>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        let projects = match &config.cache_path {
            Some(path) => ProjectStore::with_cache(documents, SnapshotCache::new(path)),
            None => ProjectStore::new(documents),
        };
        Self {
            config,
            session,
            projects,
        }
    }

    pub fn identity(&self) -> &dyn IdentityProvider {
        self.session.as_ref()
    }

    /// Initial project load
    pub async fn start(&self) -> bool {
        self.projects.initialize().await
    }
}

/// Install the rolling file logger when a log directory is configured.
/// A logger installed earlier in the process is kept.
pub fn init_logging(config: &AppConfig) -> Result<(), BootstrapError> {
    let Some(dir) = &config.log_dir else {
        return Ok(());
    };
    match rolling_logger::init_logger(dir, &config.app_name) {
        Ok(()) | Err(rolling_logger::LoggerError::AlreadyInitialized) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn open_documents(
    backend: &BackendConfig,
    session: Arc<SessionState>,
) -> Result<Arc<dyn DocumentStore>, BootstrapError> {
    let documents: Arc<dyn DocumentStore> = match backend {
        BackendConfig::Memory => {
            log::info!("using in-memory document store");
            Arc::new(MemoryDocumentStore::new())
        }
        BackendConfig::Sqlite { path } => {
            log::info!("using SQLite document store at {}", path.display());
            Arc::new(SqliteDocumentStore::open(path)?)
        }
        BackendConfig::Firestore(configured) => {
            let firestore = configured.with_env_fallback()?;
            let presence = firestore
                .presence()
                .into_iter()
                .map(|(key, set)| format!("{}={}", key, set))
                .collect::<Vec<_>>()
                .join(", ");
            log::info!("using Firestore document store ({})", presence);
            let identity: Arc<dyn IdentityProvider> = session;
            Arc::new(FirestoreDocumentStore::new(firestore, Some(identity)))
        }
    };
    Ok(documents)
}
