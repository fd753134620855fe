//! Company news posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::resource::{
    FieldKind, FieldSpec, FormFields, Resource, ResourceDraft, flag, require, row, text,
};
use super::RecordId;
use crate::backend::{Order, Row};
use crate::error::SiteError;

/// One row of `news`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct NewsItem {
    /// Primary key.
    pub id: RecordId,
    /// Headline.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Shown on the public site when set.
    pub is_published: bool,
    /// Publication time, assigned by the backend.
    pub published_date: DateTime<Utc>,
}

impl Resource for NewsItem {
    const TABLE: &'static str = "news";
    const LABEL: &'static str = "News";
    const ORDER: Option<Order> = Some(Order::desc("published_date"));
    type Draft = NewsDraft;

    fn id(&self) -> RecordId {
        self.id
    }

    fn is_public(&self) -> bool {
        self.is_published
    }

    fn summary(&self) -> (String, String) {
        let status = if self.is_published { "Published" } else { "Draft" };
        (
            self.title.clone(),
            format!("{status} · {}", self.published_date.format("%Y-%m-%d")),
        )
    }
}

/// Create/edit form for [`NewsItem`]. New posts start unpublished.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewsDraft {
    /// Headline.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Published flag.
    pub is_published: bool,
}

impl ResourceDraft<NewsItem> for NewsDraft {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("title", "Title", FieldKind::Text),
        FieldSpec::required("content", "Content", FieldKind::TextArea),
        FieldSpec::optional("is_published", "Published", FieldKind::Checkbox),
    ];

    fn from_form(form: &FormFields) -> Self {
        Self {
            title: text(form, "title"),
            content: text(form, "content"),
            is_published: flag(form, "is_published"),
        }
    }

    fn from_record(record: &NewsItem) -> Self {
        Self {
            title: record.title.clone(),
            content: record.content.clone(),
            is_published: record.is_published,
        }
    }

    fn to_row(&self) -> Result<Row, SiteError> {
        Ok(row([
            ("title", require("Title", &self.title)?),
            ("content", require("Content", &self.content)?),
            ("is_published", Value::Bool(self.is_published)),
        ]))
    }
}
