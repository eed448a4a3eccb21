//! In-Memory Document Store
//!
//! Keeps documents in process memory. Ids are issued as `p1`, `p2`, ...
//! A failure switch makes every call fail, for exercising error paths.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{NewProjectRecord, Project, ProjectPatch};
use super::traits::{DocumentStore, StoreError, StoreResult};

#[derive(Default)]
struct MemoryInner {
    documents: Vec<Project>,
    next_id: u64,
    failure: Option<StoreError>,
}

impl MemoryInner {
    fn check(&self) -> StoreResult<()> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn issue_id(&mut self) -> String {
        loop {
            self.next_id += 1;
            let id = format!("p{}", self.next_id);
            if !self.documents.iter().any(|p| p.id == id) {
                return id;
            }
        }
    }
}

#[derive(Default)]
pub struct MemoryDocumentStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with existing documents
    pub fn with_projects(projects: Vec<Project>) -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                documents: projects,
                ..Default::default()
            }),
        }
    }

    /// Make every following call fail with `err`, or clear the failure
    pub async fn fail_with(&self, err: Option<StoreError>) {
        self.inner.lock().await.failure = err;
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.documents.len()
    }

    pub async fn get(&self, id: &str) -> Option<Project> {
        let inner = self.inner.lock().await;
        inner.documents.iter().find(|p| p.id == id).cloned()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list_ordered_by_created_at_desc(&self) -> StoreResult<Vec<Project>> {
        let inner = self.inner.lock().await;
        inner.check()?;

        let mut projects = inner.documents.clone();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn create(&self, record: &NewProjectRecord) -> StoreResult<String> {
        let mut inner = self.inner.lock().await;
        inner.check()?;

        let id = inner.issue_id();
        inner.documents.push(record.clone().with_id(id.clone()));
        Ok(id)
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner.check()?;

        inner.documents.retain(|p| p.id != id);
        Ok(())
    }

    async fn update(&self, id: &str, patch: &ProjectPatch) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner.check()?;

        let project = inner
            .documents
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::missing_document(id))?;
        project.apply(patch);
        Ok(())
    }
}
