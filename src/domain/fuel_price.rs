//! Published pump/bulk prices per fuel type and region.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::resource::{
    FieldKind, FieldSpec, FormFields, Resource, ResourceDraft, date, number, require, row, text,
};
use super::RecordId;
use crate::backend::{Order, Row};
use crate::error::SiteError;

/// Value written to `source` for prices entered through the portal.
pub const MANUAL_SOURCE: &str = "manual";

/// Region pre-filled on the create form.
pub const DEFAULT_REGION: &str = "Dar es Salaam";

/// One row of `fuel_prices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FuelPrice {
    /// Primary key.
    pub id: RecordId,
    /// Fuel name as shown to customers (e.g. "Diesel").
    pub fuel_type: String,
    /// Price in TZS per liter.
    pub price_per_liter: f64,
    /// Region the price applies to.
    pub region: String,
    /// Date the price takes effect.
    pub effective_date: NaiveDate,
    /// `"manual"` for portal entries; anything else came from a feed.
    #[serde(default)]
    pub source: String,
}

impl FuelPrice {
    fn inline_row(&self, price: f64, effective: NaiveDate) -> Row {
        row([
            ("price_per_liter", Value::from(price)),
            ("effective_date", Value::String(effective.to_string())),
            ("source", Value::String(MANUAL_SOURCE.to_string())),
        ])
    }
}

impl Resource for FuelPrice {
    const TABLE: &'static str = "fuel_prices";
    const LABEL: &'static str = "Fuel price";
    const ORDER: Option<Order> = Some(Order::asc("fuel_type"));
    const INLINE_FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("price_per_liter", "Price per liter (TZS)", FieldKind::Number),
        FieldSpec::required("effective_date", "Effective date", FieldKind::Date),
    ];
    type Draft = FuelPriceDraft;

    fn id(&self) -> RecordId {
        self.id
    }

    fn summary(&self) -> (String, String) {
        (
            self.fuel_type.clone(),
            format!(
                "{} TZS/L · {} · effective {} · source: {}",
                self.price_per_liter, self.region, self.effective_date, self.source
            ),
        )
    }

    fn inline_update(&self, field: &str, raw: &str) -> Result<Option<Row>, SiteError> {
        match field {
            "price_per_liter" => {
                let price = number("Price per liter", raw)?;
                #[allow(clippy::float_cmp)]
                let unchanged = price == self.price_per_liter;
                Ok((!unchanged).then(|| self.inline_row(price, self.effective_date)))
            }
            "effective_date" => {
                let effective = date("Effective date", raw)?;
                let unchanged = effective == self.effective_date;
                Ok((!unchanged).then(|| self.inline_row(self.price_per_liter, effective)))
            }
            other => Err(SiteError::validation(format!(
                "{other} cannot be edited inline"
            ))),
        }
    }
}

/// Create form for [`FuelPrice`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelPriceDraft {
    /// Fuel name.
    pub fuel_type: String,
    /// Price as typed; validated as a number on submit.
    pub price_per_liter: String,
    /// Region.
    pub region: String,
    /// `YYYY-MM-DD`.
    pub effective_date: String,
}

impl Default for FuelPriceDraft {
    fn default() -> Self {
        Self {
            fuel_type: String::new(),
            price_per_liter: String::new(),
            region: DEFAULT_REGION.to_string(),
            effective_date: Utc::now().date_naive().to_string(),
        }
    }
}

impl ResourceDraft<FuelPrice> for FuelPriceDraft {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("fuel_type", "Fuel type", FieldKind::Text),
        FieldSpec::required("price_per_liter", "Price per liter (TZS)", FieldKind::Number),
        FieldSpec::optional("region", "Region", FieldKind::Text),
        FieldSpec::required("effective_date", "Effective date", FieldKind::Date),
    ];

    fn from_form(form: &FormFields) -> Self {
        Self {
            fuel_type: text(form, "fuel_type"),
            price_per_liter: text(form, "price_per_liter"),
            region: text(form, "region"),
            effective_date: text(form, "effective_date"),
        }
    }

    fn from_record(record: &FuelPrice) -> Self {
        Self {
            fuel_type: record.fuel_type.clone(),
            price_per_liter: record.price_per_liter.to_string(),
            region: record.region.clone(),
            effective_date: record.effective_date.to_string(),
        }
    }

    fn to_row(&self) -> Result<Row, SiteError> {
        let fuel_type = require("Fuel type", &self.fuel_type)?;
        require("Price per liter", &self.price_per_liter)?;
        let price = number("Price per liter", &self.price_per_liter)?;
        let effective = date("Effective date", &self.effective_date)?;
        Ok(row([
            ("fuel_type", fuel_type),
            ("price_per_liter", Value::from(price)),
            ("region", Value::String(self.region.clone())),
            ("effective_date", Value::String(effective.to_string())),
            ("source", Value::String(MANUAL_SOURCE.to_string())),
        ]))
    }
}
