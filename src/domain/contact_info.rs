//! The single `contact_info` row.

use serde::{Deserialize, Serialize};

use super::resource::{
    FieldKind, FieldSpec, FormFields, Resource, ResourceDraft, require, row, text,
};
use super::RecordId;
use crate::backend::{Order, Row};
use crate::error::SiteError;

/// Company contact details. The table holds exactly one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ContactInfo {
    /// Primary key.
    pub id: RecordId,
    /// Public email address.
    pub email: String,
    /// Public phone number.
    pub phone: String,
    /// Postal or street address.
    pub address: String,
}

impl ContactInfo {
    /// Copy shown when the row cannot be fetched.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            id: RecordId::from_uuid(uuid::Uuid::nil()),
            email: "info@tanzaniaenergy.co.tz".to_string(),
            phone: "+255 22 123 4567".to_string(),
            address: "Dar es Salaam, Tanzania".to_string(),
        }
    }
}

impl Resource for ContactInfo {
    const TABLE: &'static str = "contact_info";
    const LABEL: &'static str = "Contact info";
    const ORDER: Option<Order> = None;
    type Draft = ContactInfoDraft;

    fn id(&self) -> RecordId {
        self.id
    }

    fn summary(&self) -> (String, String) {
        (self.email.clone(), format!("{} · {}", self.phone, self.address))
    }
}

/// Edit form for [`ContactInfo`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactInfoDraft {
    /// Email.
    pub email: String,
    /// Phone.
    pub phone: String,
    /// Address.
    pub address: String,
}

impl ResourceDraft<ContactInfo> for ContactInfoDraft {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("email", "Email", FieldKind::Email),
        FieldSpec::required("phone", "Phone", FieldKind::Text),
        FieldSpec::required("address", "Address", FieldKind::TextArea),
    ];

    fn from_form(form: &FormFields) -> Self {
        Self {
            email: text(form, "email"),
            phone: text(form, "phone"),
            address: text(form, "address"),
        }
    }

    fn from_record(record: &ContactInfo) -> Self {
        Self {
            email: record.email.clone(),
            phone: record.phone.clone(),
            address: record.address.clone(),
        }
    }

    fn to_row(&self) -> Result<Row, SiteError> {
        Ok(row([
            ("email", require("Email", &self.email)?),
            ("phone", require("Phone", &self.phone)?),
            ("address", require("Address", &self.address)?),
        ]))
    }
}
