//! Team members shown on the About page.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::resource::{
    FieldKind, FieldSpec, FormFields, Resource, ResourceDraft, flag, optional, optional_integer,
    require, row, text,
};
use super::RecordId;
use crate::backend::{Order, Row};
use crate::error::SiteError;

/// One row of `team_members`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TeamMember {
    /// Primary key.
    pub id: RecordId,
    /// Full name.
    pub name: String,
    /// Job title.
    pub role: String,
    /// Short biography.
    #[serde(default)]
    pub bio: Option<String>,
    /// Public URL of the avatar image, usually set by an upload.
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Listed publicly when set.
    pub is_active: bool,
    /// Display position.
    #[serde(default)]
    pub order_index: i64,
}

impl TeamMember {
    /// Up to two initials, used when there is no avatar.
    #[must_use]
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

impl Resource for TeamMember {
    const TABLE: &'static str = "team_members";
    const LABEL: &'static str = "Team member";
    const ORDER: Option<Order> = Some(Order::asc("order_index"));
    type Draft = TeamMemberDraft;

    fn id(&self) -> RecordId {
        self.id
    }

    fn is_public(&self) -> bool {
        self.is_active
    }

    fn summary(&self) -> (String, String) {
        (self.name.clone(), self.role.clone())
    }
}

/// Create/edit form for [`TeamMember`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamMemberDraft {
    /// Full name.
    pub name: String,
    /// Job title.
    pub role: String,
    /// Biography.
    pub bio: String,
    /// Avatar URL; filled by the avatar upload.
    pub avatar_url: String,
    /// Display position.
    pub order_index: String,
    /// Active flag.
    pub is_active: bool,
}

impl Default for TeamMemberDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            role: String::new(),
            bio: String::new(),
            avatar_url: String::new(),
            order_index: String::new(),
            is_active: true,
        }
    }
}

impl ResourceDraft<TeamMember> for TeamMemberDraft {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("name", "Name", FieldKind::Text),
        FieldSpec::required("role", "Role", FieldKind::Text),
        FieldSpec::optional("bio", "Bio", FieldKind::TextArea),
        FieldSpec::optional("avatar_url", "Avatar URL", FieldKind::Url),
        FieldSpec::optional("order_index", "Display order", FieldKind::Number),
        FieldSpec::optional("is_active", "Active", FieldKind::Checkbox),
    ];

    fn from_form(form: &FormFields) -> Self {
        Self {
            name: text(form, "name"),
            role: text(form, "role"),
            bio: text(form, "bio"),
            avatar_url: text(form, "avatar_url"),
            order_index: text(form, "order_index"),
            is_active: flag(form, "is_active"),
        }
    }

    fn from_record(record: &TeamMember) -> Self {
        Self {
            name: record.name.clone(),
            role: record.role.clone(),
            bio: record.bio.clone().unwrap_or_default(),
            avatar_url: record.avatar_url.clone().unwrap_or_default(),
            order_index: record.order_index.to_string(),
            is_active: record.is_active,
        }
    }

    fn to_row(&self) -> Result<Row, SiteError> {
        let mut values = row([
            ("name", require("Name", &self.name)?),
            ("role", require("Role", &self.role)?),
            ("bio", optional(&self.bio)),
            ("avatar_url", optional(&self.avatar_url)),
            ("is_active", Value::Bool(self.is_active)),
        ]);
        if let Some(index) = optional_integer("Display order", &self.order_index)? {
            values.insert("order_index".to_string(), Value::from(index));
        }
        Ok(values)
    }
}
