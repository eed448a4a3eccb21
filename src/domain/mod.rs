//! Domain Layer
//!
//! Project records and inspection checklists.
//! This layer has no I/O; the repository layer persists projects.

mod checklist;
mod error;
mod project;

pub use checklist::{
    Approval, ApprovalRejected, Checklist, ChecklistItem, ChecklistSection, Progress,
};
pub use error::ValidationError;
pub use project::{NewProject, NewProjectRecord, Project, ProjectField, ProjectPatch};
