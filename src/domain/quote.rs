//! Fuel quote estimator.
//!
//! Pure arithmetic: a fixed unit price per fuel kind times the requested
//! quantity. Nothing is persisted and no prices are read from the backend.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SiteError;

/// Fuel kinds offered on the quote form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FuelKind {
    /// Diesel.
    Diesel,
    /// Petrol.
    Petrol,
}

impl FuelKind {
    /// Unit price in TZS per liter.
    #[must_use]
    pub const fn unit_price(self) -> u64 {
        match self {
            Self::Diesel => 2_850,
            Self::Petrol => 3_050,
        }
    }

    /// Parses the form value (`diesel` or `petrol`, case-insensitive).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "diesel" => Some(Self::Diesel),
            "petrol" => Some(Self::Petrol),
            _ => None,
        }
    }
}

impl fmt::Display for FuelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Diesel => "Diesel",
            Self::Petrol => "Petrol",
        })
    }
}

/// Reads the leading integer of `raw` the way a browser's `parseInt` does:
/// leading whitespace is skipped, an optional sign is accepted, and digits
/// are read until the first non-digit. Anything else, and any negative
/// result, yields 0. Values too large for `u64` saturate.
#[must_use]
pub fn parse_quantity(raw: &str) -> u64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, s.get(1..).unwrap_or_default()),
        Some(b'+') => (false, s.get(1..).unwrap_or_default()),
        _ => (false, s),
    };
    let mut value: u64 = 0;
    let mut seen = false;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        seen = true;
        value = value
            .saturating_mul(10)
            .saturating_add(u64::from(b - b'0'));
    }
    if !seen || (negative && value > 0) {
        return 0;
    }
    value
}

/// Total price in TZS for `quantity` (raw form input) liters of `kind`.
#[must_use]
pub fn estimate(kind: FuelKind, quantity: &str) -> u64 {
    kind.unit_price().saturating_mul(parse_quantity(quantity))
}

/// Formats `n` with comma thousands separators (`28,500,000`).
#[must_use]
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// A submitted quote request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuoteRequest {
    /// Company name (required).
    #[serde(default)]
    pub company_name: String,
    /// Contact person (required).
    #[serde(default)]
    pub contact_person: String,
    /// Email (required).
    #[serde(default)]
    pub email: String,
    /// Phone (required).
    #[serde(default)]
    pub phone: String,
    /// `diesel` or `petrol` (required).
    #[serde(default)]
    pub fuel_type: String,
    /// Liters, as typed (required).
    #[serde(default)]
    pub quantity: String,
    /// Delivery location (required).
    #[serde(default)]
    pub delivery_location: String,
    /// Free-form notes.
    #[serde(default)]
    pub additional_info: String,
}

/// Result of a quote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct QuoteEstimate {
    /// Fuel kind quoted.
    pub fuel_kind: FuelKind,
    /// Unit price in TZS per liter.
    pub unit_price: u64,
    /// Liters used for the estimate.
    pub quantity: u64,
    /// `unit_price × quantity`.
    pub total: u64,
}

impl QuoteRequest {
    /// Checks the required fields and computes the estimate.
    ///
    /// Quantity is only required to be non-empty; a non-numeric or
    /// negative value estimates to 0.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Validation`] naming the first missing field or
    /// an unknown fuel type.
    pub fn estimate(&self) -> Result<QuoteEstimate, SiteError> {
        let required = [
            ("Company name", &self.company_name),
            ("Contact person", &self.contact_person),
            ("Email", &self.email),
            ("Phone", &self.phone),
            ("Fuel type", &self.fuel_type),
            ("Quantity", &self.quantity),
            ("Delivery location", &self.delivery_location),
        ];
        if let Some((label, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(SiteError::validation(format!("{label} is required")));
        }
        let fuel_kind = FuelKind::parse(&self.fuel_type).ok_or_else(|| {
            SiteError::validation(format!("unknown fuel type: {}", self.fuel_type))
        })?;
        let quantity = parse_quantity(&self.quantity);
        Ok(QuoteEstimate {
            fuel_kind,
            unit_price: fuel_kind.unit_price(),
            quantity,
            total: estimate(fuel_kind, &self.quantity),
        })
    }
}
