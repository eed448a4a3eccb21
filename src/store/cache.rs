//! Snapshot Cache
//!
//! Keeps the last known project list on disk so it can be shown before the
//! first remote load finishes.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Project;

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("snapshot i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot version {0} is not supported")]
    Version(u32),
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    projects: Vec<Project>,
}

#[derive(Debug, Clone)]
pub struct SnapshotCache {
    path: PathBuf,
}

impl SnapshotCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when nothing has been saved yet
    pub fn load(&self) -> Result<Option<Vec<Project>>, CacheError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(CacheError::Version(snapshot.version));
        }
        Ok(Some(snapshot.projects))
    }

    /// Write through a uniquely named temp file in the same directory, so
    /// readers only ever see a complete snapshot
    pub fn save(&self, projects: &[Project]) -> Result<(), CacheError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let json = serde_json::to_vec(&Snapshot {
            version: SNAPSHOT_VERSION,
            projects: projects.to_vec(),
        })?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}
