//! The resource-table abstraction shared by every content entity.
//!
//! A [`Resource`] is a row type bound to one backend table: it knows the
//! table name, its display order, whether a row is visible on the public
//! site, and which [`ResourceDraft`] (form) creates and edits it. Every
//! admin manager and public listing in the crate is an instantiation of
//! this one trait pair.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::RecordId;
use crate::backend::{Order, Row};
use crate::error::SiteError;

/// Raw submitted form fields, keyed by input name.
pub type FormFields = HashMap<String, String>;

/// Input widget a field is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Single-line text.
    Text,
    /// Multi-line text.
    TextArea,
    /// Email address.
    Email,
    /// Numeric input.
    Number,
    /// `YYYY-MM-DD` date picker.
    Date,
    /// URL (filled by hand or by an upload).
    Url,
    /// Boolean checkbox.
    Checkbox,
}

/// Describes one form field for generic rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// Input name; also the column name.
    pub name: &'static str,
    /// Label shown next to the input.
    pub label: &'static str,
    /// Widget kind.
    pub kind: FieldKind,
    /// Whether the field must be non-empty.
    pub required: bool,
}

impl FieldSpec {
    /// A required field.
    #[must_use]
    pub const fn required(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: true,
        }
    }

    /// An optional field.
    #[must_use]
    pub const fn optional(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
        }
    }
}

/// A content row bound to one backend table.
pub trait Resource:
    DeserializeOwned + Serialize + Clone + fmt::Debug + Send + Sync + 'static
{
    /// Backend table name.
    const TABLE: &'static str;

    /// Human-readable singular name, used in notices ("Service created").
    const LABEL: &'static str;

    /// Display order of list reads. `None` for singleton tables.
    const ORDER: Option<Order>;

    /// Fields editable in place from the list view.
    const INLINE_FIELDS: &'static [FieldSpec] = &[];

    /// Form type that creates and edits rows of this resource.
    type Draft: ResourceDraft<Self>;

    /// Primary key of this row.
    fn id(&self) -> RecordId;

    /// Whether the row is shown on public pages. Admin views ignore this.
    fn is_public(&self) -> bool {
        true
    }

    /// Heading and secondary line used when listing the row.
    fn summary(&self) -> (String, String);

    /// Builds the update for an inline edit of `field` to `raw`.
    ///
    /// Returns `Ok(None)` when `raw` equals the last-known value, so no
    /// write is issued.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Validation`] when the field cannot be edited
    /// inline or the value does not parse.
    fn inline_update(&self, field: &str, raw: &str) -> Result<Option<Row>, SiteError> {
        let _ = raw;
        Err(SiteError::validation(format!(
            "{field} cannot be edited inline"
        )))
    }
}

/// Form state for creating or editing a [`Resource`].
///
/// `Default` is the reset state of the form. `Serialize` exposes the
/// current field values to templates.
pub trait ResourceDraft<R>: Clone + Default + fmt::Debug + Serialize + Send + Sync {
    /// Fields in display order.
    const FIELDS: &'static [FieldSpec];

    /// Reads a submitted form. Missing checkboxes read as unchecked.
    fn from_form(form: &FormFields) -> Self;

    /// Pre-fills the form from an existing row (edit mode).
    fn from_record(record: &R) -> Self;

    /// Checks required and typed fields, producing the column values to
    /// write.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Validation`] naming the first offending field.
    fn to_row(&self) -> Result<Row, SiteError>;
}

// ── Form helpers ────────────────────────────────────────────────────────

/// Returns the submitted text of `name`, or an empty string.
#[must_use]
pub fn text(form: &FormFields, name: &str) -> String {
    form.get(name).cloned().unwrap_or_default()
}

/// Reads a checkbox: present and not `false`/`off`/`0` means checked.
#[must_use]
pub fn flag(form: &FormFields, name: &str) -> bool {
    form.get(name)
        .is_some_and(|v| !matches!(v.as_str(), "false" | "off" | "0"))
}

/// Fails with "`label` is required" when `value` is blank.
///
/// # Errors
///
/// Returns [`SiteError::Validation`] for blank input.
pub fn require(label: &str, value: &str) -> Result<Value, SiteError> {
    if value.trim().is_empty() {
        return Err(SiteError::validation(format!("{label} is required")));
    }
    Ok(Value::String(value.to_string()))
}

/// Blank optional text becomes `null`.
#[must_use]
pub fn optional(value: &str) -> Value {
    if value.trim().is_empty() {
        Value::Null
    } else {
        Value::String(value.to_string())
    }
}

/// Parses a decimal number field.
///
/// # Errors
///
/// Returns [`SiteError::Validation`] when `value` is blank, not a number,
/// or not finite.
pub fn number(label: &str, value: &str) -> Result<f64, SiteError> {
    let parsed = value
        .trim()
        .parse::<f64>()
        .map_err(|_| SiteError::validation(format!("{label} must be a number")))?;
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(SiteError::validation(format!("{label} must be a number")))
    }
}

/// Parses a `YYYY-MM-DD` date field.
///
/// # Errors
///
/// Returns [`SiteError::Validation`] when `value` is not a calendar date.
pub fn date(label: &str, value: &str) -> Result<NaiveDate, SiteError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| SiteError::validation(format!("{label} must be a date (YYYY-MM-DD)")))
}

/// Parses an optional integer field; blank yields `None`.
///
/// # Errors
///
/// Returns [`SiteError::Validation`] when non-blank input is not an integer.
pub fn optional_integer(label: &str, value: &str) -> Result<Option<i64>, SiteError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    value
        .trim()
        .parse::<i64>()
        .map(Some)
        .map_err(|_| SiteError::validation(format!("{label} must be a whole number")))
}

/// Collects `(column, value)` pairs into a [`Row`].
#[must_use]
pub fn row<const N: usize>(pairs: [(&str, Value); N]) -> Row {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
