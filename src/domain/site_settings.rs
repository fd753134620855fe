//! The single `site_settings` row: company name and logo.

use serde::{Deserialize, Serialize};

use super::resource::{
    FieldKind, FieldSpec, FormFields, Resource, ResourceDraft, optional, require, row, text,
};
use super::RecordId;
use crate::backend::{Order, Row};
use crate::error::SiteError;

/// Company name used when settings cannot be fetched.
pub const DEFAULT_COMPANY_NAME: &str = "Tanzania Energy";

/// Branding shown in every page header and footer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SiteSettings {
    /// Primary key.
    pub id: RecordId,
    /// Public URL of the logo image.
    #[serde(default)]
    pub logo_url: Option<String>,
    /// Company name.
    pub company_name: String,
}

impl SiteSettings {
    /// Branding used when the row cannot be fetched.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            id: RecordId::from_uuid(uuid::Uuid::nil()),
            logo_url: None,
            company_name: DEFAULT_COMPANY_NAME.to_string(),
        }
    }
}

impl Resource for SiteSettings {
    const TABLE: &'static str = "site_settings";
    const LABEL: &'static str = "Site settings";
    const ORDER: Option<Order> = None;
    type Draft = SiteSettingsDraft;

    fn id(&self) -> RecordId {
        self.id
    }

    fn summary(&self) -> (String, String) {
        (
            self.company_name.clone(),
            self.logo_url.clone().unwrap_or_default(),
        )
    }
}

/// Edit form for [`SiteSettings`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SiteSettingsDraft {
    /// Logo URL; filled by the logo upload.
    pub logo_url: String,
    /// Company name.
    pub company_name: String,
}

impl ResourceDraft<SiteSettings> for SiteSettingsDraft {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("company_name", "Company Name", FieldKind::Text),
        FieldSpec::optional("logo_url", "Logo URL", FieldKind::Url),
    ];

    fn from_form(form: &FormFields) -> Self {
        Self {
            logo_url: text(form, "logo_url"),
            company_name: text(form, "company_name"),
        }
    }

    fn from_record(record: &SiteSettings) -> Self {
        Self {
            logo_url: record.logo_url.clone().unwrap_or_default(),
            company_name: record.company_name.clone(),
        }
    }

    fn to_row(&self) -> Result<Row, SiteError> {
        Ok(row([
            ("company_name", require("Company Name", &self.company_name)?),
            ("logo_url", optional(&self.logo_url)),
        ]))
    }
}
