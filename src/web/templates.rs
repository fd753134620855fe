//! Embedded page templates.
//!
//! Templates are compiled into the binary with `include_str!` and parsed
//! once at startup, so a malformed template fails the boot instead of the
//! first request that renders it.

use std::collections::HashMap;
use std::sync::Arc;

use axum::response::Html;
use serde::Serialize;
use serde_json::Value;
use tera::Tera;

use crate::domain::quote::format_thousands;
use crate::error::SiteError;

const SOURCES: [(&str, &str); 10] = [
    ("base.html", include_str!("../../templates/base.html")),
    ("macros.html", include_str!("../../templates/macros.html")),
    ("home.html", include_str!("../../templates/home.html")),
    ("about.html", include_str!("../../templates/about.html")),
    ("services.html", include_str!("../../templates/services.html")),
    ("industries.html", include_str!("../../templates/industries.html")),
    ("contact.html", include_str!("../../templates/contact.html")),
    ("quote.html", include_str!("../../templates/quote.html")),
    ("not_found.html", include_str!("../../templates/not_found.html")),
    ("portal.html", include_str!("../../templates/portal.html")),
];

/// Parsed template set shared by every page handler.
#[derive(Debug, Clone)]
pub struct Templates {
    tera: Arc<Tera>,
}

impl Templates {
    /// Parses the embedded templates and registers the custom filters.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Template`] when a template does not parse.
    pub fn load() -> Result<Self, SiteError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(SOURCES)?;
        tera.register_filter("thousands", thousands);
        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    /// Renders `name` with `context` serialized as the template context.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Template`] when the context does not serialize
    /// to an object or the template refers to something missing.
    pub fn render(&self, name: &str, context: &impl Serialize) -> Result<Html<String>, SiteError> {
        let context = tera::Context::from_serialize(context)?;
        Ok(Html(self.tera.render(name, &context)?))
    }
}

/// `{{ 2850000 | thousands }}` renders `2,850,000`. Fractions are rounded.
fn thousands(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let whole = value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.round() as u64)
        })
        .ok_or_else(|| tera::Error::msg(format!("thousands: not a non-negative number: {value}")))?;
    Ok(Value::String(format_thousands(whole)))
}
