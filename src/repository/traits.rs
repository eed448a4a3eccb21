//! Repository Layer - Core Traits
//!
//! The document store contract. Implementations can be in-memory, SQLite,
//! or a hosted document database.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{NewProjectRecord, Project, ProjectPatch};

/// Collection holding project documents
pub const PROJECTS_COLLECTION: &str = "projects";

/// Failure reported by a document store. The message is backend-specific
/// and may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .message.as_deref().unwrap_or("document store error"))]
pub struct StoreError {
    message: Option<String>,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// A failure with no usable detail
    pub fn opaque() -> Self {
        Self { message: None }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub(crate) fn missing_document(id: &str) -> Self {
        Self::new(format!(
            "No document to update: {}/{}",
            PROJECTS_COLLECTION, id
        ))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Project document store
///
/// Every call is one round-trip to the backend.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All projects, newest `created_at` first
    async fn list_ordered_by_created_at_desc(&self) -> StoreResult<Vec<Project>>;

    /// Store a new record and return the identifier issued for it
    async fn create(&self, record: &NewProjectRecord) -> StoreResult<String>;

    /// Remove a record. Removing an absent id succeeds.
    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// Apply a partial update. Fails if the document does not exist.
    async fn update(&self, id: &str, patch: &ProjectPatch) -> StoreResult<()>;
}
