//! Money value type

use crate::core::error::{ConversionError, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Display;
use std::str::FromStr;

/// Currency every rate set is quoted against.
pub const BASE_CURRENCY: &str = "EUR";

/// Uppercases and trims a currency code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Money {
    currency: String,
    amount: Decimal,
}

impl Money {
    /// Builds a money value from user text, e.g. `Money::new("usd", "9.99")`.
    pub fn new(currency: &str, amount: &str) -> Result<Self> {
        let text = amount.trim();
        let amount = Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .map_err(|_| ConversionError::Amount(amount.to_string()))?;
        Ok(Self::from_decimal(currency, amount))
    }

    pub fn from_decimal(currency: &str, amount: Decimal) -> Self {
        Self {
            currency: normalize_code(currency),
            amount,
        }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}
