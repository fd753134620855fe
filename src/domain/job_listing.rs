//! Open positions shown on the About page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::resource::{
    FieldKind, FieldSpec, FormFields, Resource, ResourceDraft, flag, optional, require, row, text,
};
use super::RecordId;
use crate::backend::{Order, Row};
use crate::error::SiteError;

/// One row of `job_listings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct JobListing {
    /// Primary key.
    pub id: RecordId,
    /// Job title.
    pub title: String,
    /// Department the role sits in.
    pub department: String,
    /// Work location.
    pub location: String,
    /// Role description.
    pub description: String,
    /// Free-form requirements, one per line.
    #[serde(default)]
    pub requirements: Option<String>,
    /// Listed publicly when set.
    pub is_active: bool,
    /// Insert time; newest listings come first.
    pub created_at: DateTime<Utc>,
}

impl JobListing {
    /// Non-blank requirement lines.
    #[must_use]
    pub fn requirement_lines(&self) -> Vec<&str> {
        self.requirements
            .as_deref()
            .unwrap_or_default()
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect()
    }
}

impl Resource for JobListing {
    const TABLE: &'static str = "job_listings";
    const LABEL: &'static str = "Job";
    const ORDER: Option<Order> = Some(Order::desc("created_at"));
    type Draft = JobListingDraft;

    fn id(&self) -> RecordId {
        self.id
    }

    fn is_public(&self) -> bool {
        self.is_active
    }

    fn summary(&self) -> (String, String) {
        let status = if self.is_active { "active" } else { "inactive" };
        (
            self.title.clone(),
            format!("{} · {} · {status}", self.department, self.location),
        )
    }
}

/// Create/edit form for [`JobListing`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobListingDraft {
    /// Job title.
    pub title: String,
    /// Department.
    pub department: String,
    /// Location.
    pub location: String,
    /// Description.
    pub description: String,
    /// Requirements.
    pub requirements: String,
    /// Active flag.
    pub is_active: bool,
}

impl Default for JobListingDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            department: String::new(),
            location: String::new(),
            description: String::new(),
            requirements: String::new(),
            is_active: true,
        }
    }
}

impl ResourceDraft<JobListing> for JobListingDraft {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("title", "Job Title", FieldKind::Text),
        FieldSpec::required("department", "Department", FieldKind::Text),
        FieldSpec::required("location", "Location", FieldKind::Text),
        FieldSpec::required("description", "Description", FieldKind::TextArea),
        FieldSpec::optional("requirements", "Requirements", FieldKind::TextArea),
        FieldSpec::optional("is_active", "Active", FieldKind::Checkbox),
    ];

    fn from_form(form: &FormFields) -> Self {
        Self {
            title: text(form, "title"),
            department: text(form, "department"),
            location: text(form, "location"),
            description: text(form, "description"),
            requirements: text(form, "requirements"),
            is_active: flag(form, "is_active"),
        }
    }

    fn from_record(record: &JobListing) -> Self {
        Self {
            title: record.title.clone(),
            department: record.department.clone(),
            location: record.location.clone(),
            description: record.description.clone(),
            requirements: record.requirements.clone().unwrap_or_default(),
            is_active: record.is_active,
        }
    }

    fn to_row(&self) -> Result<Row, SiteError> {
        Ok(row([
            ("title", require("Job Title", &self.title)?),
            ("department", require("Department", &self.department)?),
            ("location", require("Location", &self.location)?),
            ("description", require("Description", &self.description)?),
            ("requirements", optional(&self.requirements)),
            ("is_active", Value::Bool(self.is_active)),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_listing_defaults_to_active() {
        assert!(JobListingDraft::default().is_active);
    }

    #[test]
    fn validation_names_first_missing_field() {
        let draft = JobListingDraft {
            title: "Depot Supervisor".to_string(),
            ..JobListingDraft::default()
        };
        let err = draft.to_row().err().map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("Department is required"));
    }

    #[test]
    fn requirement_lines_skip_blanks() {
        let job = JobListing {
            id: RecordId::new(),
            title: "Driver".to_string(),
            department: "Logistics".to_string(),
            location: "Mwanza".to_string(),
            description: "Tanker driver".to_string(),
            requirements: Some("Class E licence\n\n  3 years experience ".to_string()),
            is_active: true,
            created_at: Utc::now(),
        };
        assert_eq!(
            job.requirement_lines(),
            vec!["Class E licence", "3 years experience"]
        );
    }
}
