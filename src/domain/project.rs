//! Project Entity
//!
//! A civil-engineering project record as stored in the `projects` collection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::ValidationError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A project record.
///
/// `id` is issued by the document store; `created_at` is stamped by the
/// client when the record is first submitted and is the only ordering key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    /// ISO-8601 date
    pub date: String,
    /// Free-text weekday label, not derived from `date`
    pub day: String,
    pub start_date: String,
    pub end_date: String,
    pub contractor: String,
    pub consultant: String,
    /// Milliseconds since epoch
    pub created_at: i64,
}

impl Project {
    /// Shallow merge of every field present in `patch`
    pub fn apply(&mut self, patch: &ProjectPatch) {
        for (field, value) in patch.fields() {
            *self.field_mut(field) = value.to_string();
        }
    }

    fn field_mut(&mut self, field: ProjectField) -> &mut String {
        match field {
            ProjectField::Name => &mut self.name,
            ProjectField::Date => &mut self.date,
            ProjectField::Day => &mut self.day,
            ProjectField::StartDate => &mut self.start_date,
            ProjectField::EndDate => &mut self.end_date,
            ProjectField::Contractor => &mut self.contractor,
            ProjectField::Consultant => &mut self.consultant,
        }
    }
}

/// Mutable text fields of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectField {
    Name,
    Date,
    Day,
    StartDate,
    EndDate,
    Contractor,
    Consultant,
}

impl ProjectField {
    pub const ALL: [ProjectField; 7] = [
        ProjectField::Name,
        ProjectField::Date,
        ProjectField::Day,
        ProjectField::StartDate,
        ProjectField::EndDate,
        ProjectField::Contractor,
        ProjectField::Consultant,
    ];

    /// Field name in the stored document
    pub fn field_path(&self) -> &'static str {
        match self {
            ProjectField::Name => "name",
            ProjectField::Date => "date",
            ProjectField::Day => "day",
            ProjectField::StartDate => "startDate",
            ProjectField::EndDate => "endDate",
            ProjectField::Contractor => "contractor",
            ProjectField::Consultant => "consultant",
        }
    }

    /// Column name in the SQLite table
    pub fn column(&self) -> &'static str {
        match self {
            ProjectField::Name => "name",
            ProjectField::Date => "date",
            ProjectField::Day => "day",
            ProjectField::StartDate => "start_date",
            ProjectField::EndDate => "end_date",
            ProjectField::Contractor => "contractor",
            ProjectField::Consultant => "consultant",
        }
    }

    fn is_date(&self) -> bool {
        matches!(
            self,
            ProjectField::Date | ProjectField::StartDate | ProjectField::EndDate
        )
    }

    fn check(&self, value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::BlankField(self.field_path()));
        }
        if self.is_date() && NaiveDate::parse_from_str(value, DATE_FORMAT).is_err() {
            return Err(ValidationError::InvalidDate {
                field: self.field_path(),
                value: value.to_string(),
            });
        }
        Ok(())
    }
}

/// Everything the caller supplies when creating a project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    pub date: String,
    pub day: String,
    pub start_date: String,
    pub end_date: String,
    pub contractor: String,
    pub consultant: String,
}

impl NewProject {
    fn value(&self, field: ProjectField) -> &str {
        match field {
            ProjectField::Name => &self.name,
            ProjectField::Date => &self.date,
            ProjectField::Day => &self.day,
            ProjectField::StartDate => &self.start_date,
            ProjectField::EndDate => &self.end_date,
            ProjectField::Contractor => &self.contractor,
            ProjectField::Consultant => &self.consultant,
        }
    }

    /// Every field is required; the three date fields must be `YYYY-MM-DD`
    pub fn validate(&self) -> Result<(), ValidationError> {
        ProjectField::ALL
            .iter()
            .try_for_each(|field| field.check(self.value(*field)))
    }

    /// Stamp the creation time, producing the record sent to the store
    pub fn into_record(self, created_at: i64) -> NewProjectRecord {
        NewProjectRecord {
            project: self,
            created_at,
        }
    }
}

/// A project as submitted for creation: no id yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProjectRecord {
    #[serde(flatten)]
    pub project: NewProject,
    pub created_at: i64,
}

impl NewProjectRecord {
    pub fn value(&self, field: ProjectField) -> &str {
        self.project.value(field)
    }

    pub fn with_id(self, id: String) -> Project {
        let NewProject {
            name,
            date,
            day,
            start_date,
            end_date,
            contractor,
            consultant,
        } = self.project;
        Project {
            id,
            name,
            date,
            day,
            start_date,
            end_date,
            contractor,
            consultant,
            created_at: self.created_at,
        }
    }
}

/// Partial update. `id` and `created_at` cannot be expressed here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contractor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consultant: Option<String>,
}

impl ProjectPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, value: impl Into<String>) -> Self {
        self.name = Some(value.into());
        self
    }

    pub fn date(mut self, value: impl Into<String>) -> Self {
        self.date = Some(value.into());
        self
    }

    pub fn day(mut self, value: impl Into<String>) -> Self {
        self.day = Some(value.into());
        self
    }

    pub fn start_date(mut self, value: impl Into<String>) -> Self {
        self.start_date = Some(value.into());
        self
    }

    pub fn end_date(mut self, value: impl Into<String>) -> Self {
        self.end_date = Some(value.into());
        self
    }

    pub fn contractor(mut self, value: impl Into<String>) -> Self {
        self.contractor = Some(value.into());
        self
    }

    pub fn consultant(mut self, value: impl Into<String>) -> Self {
        self.consultant = Some(value.into());
        self
    }

    fn value(&self, field: ProjectField) -> Option<&str> {
        let value = match field {
            ProjectField::Name => &self.name,
            ProjectField::Date => &self.date,
            ProjectField::Day => &self.day,
            ProjectField::StartDate => &self.start_date,
            ProjectField::EndDate => &self.end_date,
            ProjectField::Contractor => &self.contractor,
            ProjectField::Consultant => &self.consultant,
        };
        value.as_deref()
    }

    /// Present fields in declaration order
    pub fn fields(&self) -> Vec<(ProjectField, &str)> {
        ProjectField::ALL
            .iter()
            .filter_map(|field| self.value(*field).map(|value| (*field, value)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.fields()
            .into_iter()
            .try_for_each(|(field, value)| field.check(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site_a() -> NewProject {
        NewProject {
            name: "Site A".to_string(),
            date: "2025-01-01".to_string(),
            day: "Wednesday".to_string(),
            start_date: "2025-01-01".to_string(),
            end_date: "2025-06-01".to_string(),
            contractor: "ACME".to_string(),
            consultant: "BuildCo".to_string(),
        }
    }

    #[test]
    fn test_valid_project_passes() {
        assert!(site_a().validate().is_ok());
    }

    #[test]
    fn test_blank_name_rejected() {
        let project = NewProject {
            name: "   ".to_string(),
            ..site_a()
        };
        assert_eq!(project.validate(), Err(ValidationError::BlankField("name")));
    }

    #[test]
    fn test_bad_date_rejected() {
        let project = NewProject {
            end_date: "June 1st".to_string(),
            ..site_a()
        };
        assert!(matches!(
            project.validate(),
            Err(ValidationError::InvalidDate { field: "endDate", .. })
        ));
    }

    #[test]
    fn test_patch_touches_only_present_fields() {
        let mut project = site_a().into_record(42).with_id("p1".to_string());
        let before = project.clone();

        project.apply(&ProjectPatch::new().name("X"));

        assert_eq!(project.name, "X");
        assert_eq!(project.id, before.id);
        assert_eq!(project.created_at, before.created_at);
        assert_eq!(project.date, before.date);
        assert_eq!(project.contractor, before.contractor);
        assert_eq!(project.consultant, before.consultant);
    }

    #[test]
    fn test_patch_validation_ignores_absent_fields() {
        assert!(ProjectPatch::new().validate().is_ok());
        assert!(ProjectPatch::new().contractor("New Co").validate().is_ok());
        assert!(ProjectPatch::new().start_date("soon").validate().is_err());
    }

    #[test]
    fn test_serialized_field_names() {
        let project = site_a().into_record(7).with_id("p9".to_string());
        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["startDate"], "2025-01-01");
        assert_eq!(json["createdAt"], 7);

        let patch = serde_json::to_value(ProjectPatch::new().end_date("2025-07-01")).unwrap();
        assert_eq!(patch, serde_json::json!({ "endDate": "2025-07-01" }));
    }
}
