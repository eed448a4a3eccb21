//! Project Store
//!
//! The app-wide list of projects, mirrored to a document store.
//!
//! Every mutation goes to the document store first; the local list only
//! changes once the remote call succeeds. Failures never propagate out of
//! an operation: they are written to the `error` field, which (together
//! with the busy flag) consumers observe through [`ProjectStore::subscribe`].

mod cache;

#[cfg(test)]
mod tests;

use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::domain::{NewProject, Project, ProjectPatch};
use crate::repository::{DocumentStore, StoreError};

pub use cache::{CacheError, SnapshotCache};

/// Observable store state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub projects: Vec<Project>,
    /// Remote calls in flight
    pub pending: usize,
    /// Message of the most recent failure, cleared when an operation starts
    pub error: Option<String>,
}

impl StoreState {
    pub fn is_busy(&self) -> bool {
        self.pending > 0
    }
}

pub struct ProjectStore {
    documents: Arc<dyn DocumentStore>,
    state: watch::Sender<StoreState>,
    cache: Option<SnapshotCache>,
    /// Serializes snapshot writes so the newest list is always written last
    persist_lock: Mutex<()>,
}

impl ProjectStore {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self {
            documents,
            state,
            cache: None,
            persist_lock: Mutex::new(()),
        }
    }

    /// Start from the cached snapshot, and keep it updated
    pub fn with_cache(documents: Arc<dyn DocumentStore>, cache: SnapshotCache) -> Self {
        let mut store = Self::new(documents);
        match cache.load() {
            Ok(Some(projects)) => {
                log::info!("restored {} projects from {}", projects.len(), cache.path().display());
                store.state.send_modify(|s| s.projects = projects);
            }
            Ok(None) => {}
            Err(e) => log::warn!("ignoring project snapshot {}: {}", cache.path().display(), e),
        }
        store.cache = Some(cache);
        store
    }

    // ========================
    // Observation
    // ========================

    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    pub fn projects(&self) -> Vec<Project> {
        self.state.borrow().projects.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.state.borrow().is_busy()
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.state.send_modify(|s| s.error = Some(message));
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    /// Local lookup only
    pub fn get_project(&self, id: &str) -> Option<Project> {
        self.state.borrow().projects.iter().find(|p| p.id == id).cloned()
    }

    // ========================
    // Operations
    // ========================

    /// Replace the local list with every stored project, newest first.
    /// On failure the current list stays as it is.
    pub async fn initialize(&self) -> bool {
        self.begin();
        match self.documents.list_ordered_by_created_at_desc().await {
            Ok(projects) => {
                log::info!("loaded {} projects", projects.len());
                self.finish(|list| *list = projects);
                true
            }
            Err(e) => {
                self.fail(e, "Failed to fetch projects");
                false
            }
        }
    }

    /// Create a project. It appears locally only once the document store
    /// has issued its id.
    pub async fn add_project(&self, project: NewProject) -> Option<Project> {
        if let Err(e) = project.validate() {
            self.set_error(e.to_string());
            return None;
        }

        self.begin();
        let record = project.into_record(chrono::Local::now().timestamp_millis());
        match self.documents.create(&record).await {
            Ok(id) => {
                let created = record.with_id(id);
                log::info!("created project {} ({})", created.id, created.name);
                let added = created.clone();
                self.finish(move |list| {
                    list.retain(|p| p.id != added.id);
                    list.push(added);
                });
                Some(created)
            }
            Err(e) => {
                self.fail(e, "Failed to add project");
                None
            }
        }
    }

    pub async fn delete_project(&self, id: &str) -> bool {
        self.begin();
        match self.documents.delete(id).await {
            Ok(()) => {
                log::info!("deleted project {}", id);
                self.finish(|list| list.retain(|p| p.id != id));
                true
            }
            Err(e) => {
                self.fail(e, "Failed to delete project");
                false
            }
        }
    }

    /// Patch a project. A project missing from the local list is only
    /// updated remotely.
    pub async fn update_project(&self, id: &str, patch: ProjectPatch) -> bool {
        if let Err(e) = patch.validate() {
            self.set_error(e.to_string());
            return false;
        }

        self.begin();
        match self.documents.update(id, &patch).await {
            Ok(()) => {
                self.finish(|list| match list.iter_mut().find(|p| p.id == id) {
                    Some(project) => project.apply(&patch),
                    None => log::debug!("updated project {} is not in the local list", id),
                });
                true
            }
            Err(e) => {
                self.fail(e, "Failed to update project");
                false
            }
        }
    }

    // ========================
    // Helpers
    // ========================

    fn begin(&self) {
        self.state.send_modify(|s| {
            s.pending += 1;
            s.error = None;
        });
    }

    fn finish(&self, apply: impl FnOnce(&mut Vec<Project>)) {
        self.state.send_modify(|s| {
            s.pending = s.pending.saturating_sub(1);
            apply(&mut s.projects);
        });
        self.persist();
    }

    fn fail(&self, err: StoreError, fallback: &str) {
        let message = err.message().unwrap_or(fallback).to_string();
        log::warn!("{}: {}", fallback, message);
        self.state.send_modify(|s| {
            s.pending = s.pending.saturating_sub(1);
            s.error = Some(message);
        });
    }

    fn persist(&self) {
        let Some(cache) = &self.cache else {
            return;
        };
        let _guard = self.persist_lock.lock().unwrap_or_else(|e| e.into_inner());
        let projects = self.projects();
        if let Err(e) = cache.save(&projects) {
            log::warn!("failed to write project snapshot {}: {}", cache.path().display(), e);
        }
    }
}
