//! Service offerings managed from the portal.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::resource::{
    FieldKind, FieldSpec, FormFields, Resource, ResourceDraft, flag, optional, optional_integer,
    require, row, text,
};
use super::RecordId;
use crate::backend::{Order, Row};
use crate::error::SiteError;

/// One row of `services`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Service {
    /// Primary key.
    pub id: RecordId,
    /// Service name.
    pub title: String,
    /// Short description.
    pub description: String,
    /// Icon name rendered next to the title.
    #[serde(default)]
    pub icon: Option<String>,
    /// Longer details, one bullet per line.
    #[serde(default)]
    pub details: Option<String>,
    /// Listed publicly when set.
    pub is_active: bool,
    /// Display position; ties keep backend order.
    #[serde(default)]
    pub order_index: i64,
}

impl Resource for Service {
    const TABLE: &'static str = "services";
    const LABEL: &'static str = "Service";
    const ORDER: Option<Order> = Some(Order::asc("order_index"));
    type Draft = ServiceDraft;

    fn id(&self) -> RecordId {
        self.id
    }

    fn is_public(&self) -> bool {
        self.is_active
    }

    fn summary(&self) -> (String, String) {
        (self.title.clone(), self.description.clone())
    }
}

/// Create/edit form for [`Service`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDraft {
    /// Service name.
    pub title: String,
    /// Short description.
    pub description: String,
    /// Icon name.
    pub icon: String,
    /// Details.
    pub details: String,
    /// Display position; blank keeps the backend default.
    pub order_index: String,
    /// Active flag.
    pub is_active: bool,
}

impl Default for ServiceDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            icon: String::new(),
            details: String::new(),
            order_index: String::new(),
            is_active: true,
        }
    }
}

impl ResourceDraft<Service> for ServiceDraft {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("title", "Title", FieldKind::Text),
        FieldSpec::required("description", "Description", FieldKind::TextArea),
        FieldSpec::optional("icon", "Icon (icon name)", FieldKind::Text),
        FieldSpec::optional("details", "Details", FieldKind::TextArea),
        FieldSpec::optional("order_index", "Display order", FieldKind::Number),
        FieldSpec::optional("is_active", "Active", FieldKind::Checkbox),
    ];

    fn from_form(form: &FormFields) -> Self {
        Self {
            title: text(form, "title"),
            description: text(form, "description"),
            icon: text(form, "icon"),
            details: text(form, "details"),
            order_index: text(form, "order_index"),
            is_active: flag(form, "is_active"),
        }
    }

    fn from_record(record: &Service) -> Self {
        Self {
            title: record.title.clone(),
            description: record.description.clone(),
            icon: record.icon.clone().unwrap_or_default(),
            details: record.details.clone().unwrap_or_default(),
            order_index: record.order_index.to_string(),
            is_active: record.is_active,
        }
    }

    fn to_row(&self) -> Result<Row, SiteError> {
        let mut values = row([
            ("title", require("Title", &self.title)?),
            ("description", require("Description", &self.description)?),
            ("icon", optional(&self.icon)),
            ("details", optional(&self.details)),
            ("is_active", Value::Bool(self.is_active)),
        ]);
        if let Some(index) = optional_integer("Display order", &self.order_index)? {
            values.insert("order_index".to_string(), Value::from(index));
        }
        Ok(values)
    }
}
