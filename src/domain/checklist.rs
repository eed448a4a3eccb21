//! Checklist Entity
//!
//! Inspection checklists: ordered sections of items that are ticked off one
//! by one. A checklist can only be approved once every item is checked.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single inspection step. Only `checked` changes after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    id: u32,
    text: String,
    checked: bool,
}

impl ChecklistItem {
    pub fn new(id: u32, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            checked: false,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistSection {
    id: String,
    title: String,
    items: Vec<ChecklistItem>,
}

impl ChecklistSection {
    /// Item ids must be unique within the section
    pub fn new(id: impl Into<String>, title: impl Into<String>, items: Vec<ChecklistItem>) -> Self {
        debug_assert!(
            items
                .iter()
                .enumerate()
                .all(|(n, item)| items[..n].iter().all(|earlier| earlier.id != item.id)),
            "duplicate checklist item id"
        );
        Self {
            id: id.into(),
            title: title.into(),
            items,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn items(&self) -> &[ChecklistItem] {
        &self.items
    }
}

/// Checked vs. total item counts across all sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub checked: usize,
    pub total: usize,
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {} completed", self.checked, self.total)
    }
}

/// Accepted approval, carrying the confirmation shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approval {
    pub message: String,
}

/// Approval attempted with unchecked items left
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApprovalRejected {
    pub message: String,
    pub progress: Progress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    title: String,
    /// Lower-case noun used in user-facing messages ("excavation")
    subject: String,
    sections: Vec<ChecklistSection>,
}

impl Checklist {
    pub fn new(
        title: impl Into<String>,
        subject: impl Into<String>,
        sections: Vec<ChecklistSection>,
    ) -> Self {
        Self {
            title: title.into(),
            subject: subject.into(),
            sections,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn sections(&self) -> &[ChecklistSection] {
        &self.sections
    }

    pub fn section(&self, section_id: &str) -> Option<&ChecklistSection> {
        self.sections.iter().find(|s| s.id == section_id)
    }

    /// Flip the item identified by both ids. Returns the new flag, or `None`
    /// if nothing matched.
    pub fn toggle_item(&mut self, section_id: &str, item_id: u32) -> Option<bool> {
        let item = self
            .sections
            .iter_mut()
            .find(|s| s.id == section_id)?
            .items
            .iter_mut()
            .find(|i| i.id == item_id)?;
        item.checked = !item.checked;
        Some(item.checked)
    }

    /// Vacuously true for a checklist without items
    pub fn is_fully_checked(&self) -> bool {
        self.items().all(|i| i.checked)
    }

    pub fn progress(&self) -> Progress {
        Progress {
            checked: self.items().filter(|i| i.checked).count(),
            total: self.items().count(),
        }
    }

    pub fn approve(&self) -> Result<Approval, ApprovalRejected> {
        if !self.is_fully_checked() {
            return Err(ApprovalRejected {
                message: format!(
                    "Please complete all {} checklist items before approval.",
                    self.subject
                ),
                progress: self.progress(),
            });
        }
        Ok(Approval {
            message: format!(
                "All {} items checked! {} work approved.",
                self.subject,
                capitalize(&self.subject)
            ),
        })
    }

    /// Uncheck everything
    pub fn reset(&mut self) {
        self.sections
            .iter_mut()
            .flat_map(|s| s.items.iter_mut())
            .for_each(|i| i.checked = false);
    }

    fn items(&self) -> impl Iterator<Item = &ChecklistItem> {
        self.sections.iter().flat_map(|s| s.items.iter())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
