//! Quote estimate DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::quote::{FuelKind, QuoteEstimate, format_thousands};

/// Response body for `POST /api/v1/quote`.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuoteResponse {
    /// Fuel quoted.
    pub fuel_type: FuelKind,
    /// TZS per liter.
    pub unit_price: u64,
    /// Liters the estimate was computed for.
    pub quantity: u64,
    /// Estimated total in TZS, excluding delivery.
    pub total: u64,
    /// `total` with thousands separators, e.g. `"28,500,000"`.
    pub total_formatted: String,
    /// Always `"TZS"`.
    pub currency: &'static str,
}

impl From<QuoteEstimate> for QuoteResponse {
    fn from(estimate: QuoteEstimate) -> Self {
        Self {
            fuel_type: estimate.fuel_kind,
            unit_price: estimate.unit_price,
            quantity: estimate.quantity,
            total: estimate.total,
            total_formatted: format_thousands(estimate.total),
            currency: "TZS",
        }
    }
}
