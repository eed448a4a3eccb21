//! SQLite Document Store
//!
//! Local, single-file backend for the `projects` collection.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection, Row};
use tokio::sync::Mutex;

use crate::domain::{NewProjectRecord, Project, ProjectField, ProjectPatch};
use super::traits::{DocumentStore, StoreError, StoreResult};

const PROJECT_COLUMNS: &str =
    "id, name, date, day, start_date, end_date, contractor, consultant, created_at";

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::new(e.to_string())
    }
}

pub struct SqliteDocumentStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDocumentStore {
    /// Open (or create) the database file and run migrations
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::new(format!("Failed to create {}: {}", parent.display(), e)))?;
            }
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

/// Create the projects table if it doesn't exist
fn run_migrations(conn: &Connection) -> StoreResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            date TEXT NOT NULL,
            day TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            contractor TEXT NOT NULL,
            consultant TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_projects_created_at ON projects(created_at)",
        [],
    )?;

    Ok(())
}

fn row_to_project(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        date: row.get(2)?,
        day: row.get(3)?,
        start_date: row.get(4)?,
        end_date: row.get(5)?,
        contractor: row.get(6)?,
        consultant: row.get(7)?,
        created_at: row.get(8)?,
    })
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn list_ordered_by_created_at_desc(&self) -> StoreResult<Vec<Project>> {
        let conn = self.conn.lock().await;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM projects ORDER BY created_at DESC",
            PROJECT_COLUMNS
        ))?;
        let projects = stmt
            .query_map([], row_to_project)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    async fn create(&self, record: &NewProjectRecord) -> StoreResult<String> {
        let conn = self.conn.lock().await;

        let id = uuid::Uuid::new_v4().to_string();
        conn.execute(
            &format!(
                "INSERT INTO projects ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                PROJECT_COLUMNS
            ),
            params![
                id,
                record.value(ProjectField::Name),
                record.value(ProjectField::Date),
                record.value(ProjectField::Day),
                record.value(ProjectField::StartDate),
                record.value(ProjectField::EndDate),
                record.value(ProjectField::Contractor),
                record.value(ProjectField::Consultant),
                record.created_at,
            ],
        )?;
        Ok(id)
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        Ok(())
    }

    async fn update(&self, id: &str, patch: &ProjectPatch) -> StoreResult<()> {
        let conn = self.conn.lock().await;

        let fields = patch.fields();
        let changed = if fields.is_empty() {
            conn.query_row(
                "SELECT COUNT(*) FROM projects WHERE id = ?1",
                params![id],
                |row| row.get::<_, i64>(0),
            )? as usize
        } else {
            let assignments = fields
                .iter()
                .enumerate()
                .map(|(i, (field, _))| format!("{} = ?{}", field.column(), i + 1))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "UPDATE projects SET {} WHERE id = ?{}",
                assignments,
                fields.len() + 1
            );
            let values = fields
                .iter()
                .map(|(_, value)| *value)
                .chain(std::iter::once(id));
            conn.execute(&sql, params_from_iter(values))?
        };

        if changed == 0 {
            return Err(StoreError::missing_document(id));
        }
        Ok(())
    }
}
