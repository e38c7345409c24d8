//! Cross-rate conversion of a money value through one rate set.

use crate::core::error::{ConversionError, Result};
use crate::core::money::{BASE_CURRENCY, Money, normalize_code};
use crate::core::rates::RateSet;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Decimal places of a converted amount.
pub const AMOUNT_SCALE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub amount: Decimal,
    pub currency: String,
}

/// Converts `money` into `destination` using rates quoted against the base currency.
///
/// The quotient is rounded to two places, midpoints away from zero.
pub fn convert(money: &Money, destination: &str, rates: &RateSet) -> Result<ConversionResult> {
    let source = money.currency();
    let destination = normalize_code(destination);
    let ratio = ratio(source, &destination, rates)?;

    let amount = money
        .amount()
        .checked_div(ratio)
        .ok_or_else(|| ConversionError::Amount(money.amount().to_string()))?
        .round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    debug!(%source, %destination, %ratio, %amount, "Converted amount");

    Ok(ConversionResult {
        amount,
        currency: destination,
    })
}

/// Units of `source` per unit of `destination`.
fn ratio(source: &str, destination: &str, rates: &RateSet) -> Result<Decimal> {
    if source == destination {
        return Ok(Decimal::ONE);
    }
    if source == BASE_CURRENCY {
        return divide(Decimal::ONE, destination, rates);
    }
    let source_rate = lookup(source, rates)?;
    if destination == BASE_CURRENCY {
        return Ok(source_rate);
    }
    divide(source_rate, destination, rates)
}

fn divide(numerator: Decimal, code: &str, rates: &RateSet) -> Result<Decimal> {
    let rate = lookup(code, rates)?;
    numerator
        .checked_div(rate)
        .ok_or_else(|| ConversionError::RateValue {
            currency: code.to_string(),
            value: rate.to_string(),
        })
}

fn lookup(code: &str, rates: &RateSet) -> Result<Decimal> {
    let rate = rates.get(code).ok_or_else(|| {
        warn!(currency = %code, "Unknown currency requested");
        ConversionError::Currency {
            code: code.to_string(),
            valid: rates.currencies(),
        }
    })?;
    Decimal::from_f64(rate).ok_or_else(|| ConversionError::RateValue {
        currency: code.to_string(),
        value: rate.to_string(),
    })
}
