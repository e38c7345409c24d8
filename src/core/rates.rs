//! Raw rate tables and the normalized per-date rate set.

use crate::core::error::{ConversionError, Result};
use crate::core::money::{BASE_CURRENCY, normalize_code};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, error};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Currency code and rate text pairs, as found in the document.
pub type RawRates = Vec<(String, String)>;

/// Every reference date of one document with its unparsed rates.
///
/// Dates keep their first-seen order, so the first date of an ECB
/// document is the most recent one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    dates: Vec<String>,
    entries: HashMap<String, RawRates>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a (possibly repeated) date block; a repeated date starts over empty.
    pub fn start_date(&mut self, date: &str) {
        if self.entries.insert(date.to_string(), Vec::new()).is_none() {
            self.dates.push(date.to_string());
        }
    }

    /// Records a rate under `date`, overwriting an earlier entry for the same code.
    pub fn push_rate(&mut self, date: &str, currency: &str, rate: &str) {
        if !self.entries.contains_key(date) {
            self.start_date(date);
        }
        if let Some(rates) = self.entries.get_mut(date) {
            match rates.iter_mut().find(|(code, _)| code == currency) {
                Some(entry) => entry.1 = rate.to_string(),
                None => rates.push((currency.to_string(), rate.to_string())),
            }
        }
    }

    pub fn get(&self, date: &str) -> Option<&RawRates> {
        self.entries.get(date)
    }

    pub fn contains(&self, date: &str) -> bool {
        self.entries.contains_key(date)
    }

    /// Dates in document order.
    pub fn dates(&self) -> &[String] {
        &self.dates
    }

    pub fn latest(&self) -> Option<&str> {
        self.dates.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Validated rates of one reference date against [`BASE_CURRENCY`].
#[derive(Debug, Clone, PartialEq)]
pub struct RateSet {
    reference_date: NaiveDate,
    codes: Vec<String>,
    rates: HashMap<String, f64>,
}

/// Parses a strict `YYYY-MM-DD` calendar date.
pub fn parse_reference_date(text: &str) -> Result<NaiveDate> {
    let invalid = || ConversionError::DateFormat {
        input: text.to_string(),
        available: Vec::new(),
    };
    if text.len() != 10 {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| invalid())
}

impl RateSet {
    pub fn from_raw(reference_date: &str, raw_rates: &[(String, String)]) -> Result<Self> {
        let reference_date = parse_reference_date(reference_date)?;

        let mut codes = Vec::with_capacity(raw_rates.len());
        let mut rates = HashMap::with_capacity(raw_rates.len());
        for (currency, value) in raw_rates {
            let code = normalize_code(currency);
            if code == BASE_CURRENCY {
                debug!("Skipping base currency entry on {}", reference_date);
                continue;
            }
            let rate = parse_rate(&code, value)?;
            if rates.insert(code.clone(), rate).is_none() {
                codes.push(code);
            }
        }

        Ok(Self {
            reference_date,
            codes,
            rates,
        })
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Rate of `code` against the base currency, if quoted.
    pub fn get(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// Quoted codes with their rates, in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.codes
            .iter()
            .map(|code| (code.as_str(), self.rates[code]))
    }

    /// The base currency followed by every quoted code.
    pub fn currencies(&self) -> Vec<String> {
        std::iter::once(BASE_CURRENCY.to_string())
            .chain(self.codes.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

fn parse_rate(code: &str, value: &str) -> Result<f64> {
    match value.trim().parse::<f64>() {
        Ok(rate) if rate.is_finite() && rate > 0.0 => Ok(rate),
        _ => {
            error!(currency = %code, value = %value, "Invalid rate in source document");
            Err(ConversionError::RateValue {
                currency: code.to_string(),
                value: value.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> RawRates {
        pairs
            .iter()
            .map(|(c, r)| (c.to_string(), r.to_string()))
            .collect()
    }

    #[test]
    fn test_rate_set_normalizes_codes_and_values() {
        let rates = RateSet::from_raw("2018-11-23", &raw(&[("usd", "1.1363"), ("ZAR", "15.7322")]))
            .unwrap();

        assert_eq!(
            rates.reference_date(),
            NaiveDate::from_ymd_opt(2018, 11, 23).unwrap()
        );
        assert_eq!(rates.get("USD"), Some(1.1363));
        assert_eq!(rates.get("ZAR"), Some(15.7322));
        assert_eq!(rates.get("usd"), None);
        assert_eq!(rates.currencies(), vec!["EUR", "USD", "ZAR"]);
    }

    #[test]
    fn test_rate_set_duplicate_codes_last_wins() {
        let rates =
            RateSet::from_raw("2018-11-23", &raw(&[("usd", "1.0"), ("USD", "1.1352")])).unwrap();
        assert_eq!(rates.len(), 1);
        assert_eq!(rates.get("USD"), Some(1.1352));
    }

    #[test]
    fn test_rate_set_never_holds_base_currency() {
        let rates =
            RateSet::from_raw("2018-11-23", &raw(&[("EUR", "1"), ("USD", "1.1352")])).unwrap();
        assert_eq!(rates.get("EUR"), None);
        assert_eq!(rates.currencies(), vec!["EUR", "USD"]);
    }

    #[test]
    fn test_rate_set_bad_date() {
        for date in ["2018-11-31", "26/11/2018", "2018-1-5", ""] {
            let err = RateSet::from_raw(date, &raw(&[("USD", "1.1352")])).unwrap_err();
            assert!(
                matches!(err, ConversionError::DateFormat { ref input, .. } if input == date),
                "unexpected error for {date}: {err:?}"
            );
        }
    }

    #[test]
    fn test_rate_set_bad_rate() {
        for value in ["abc", "0", "-1.2", "inf", ""] {
            let err = RateSet::from_raw("2018-11-23", &raw(&[("USD", value)])).unwrap_err();
            assert_eq!(
                err,
                ConversionError::RateValue {
                    currency: "USD".to_string(),
                    value: value.to_string(),
                }
            );
        }
    }

    #[test]
    fn test_rate_table_keeps_document_order() {
        let mut table = RateTable::new();
        table.start_date("2018-11-26");
        table.push_rate("2018-11-26", "USD", "1.1363");
        table.start_date("2018-08-29");
        table.push_rate("2018-08-29", "USD", "1.166");
        table.push_rate("2018-08-29", "USD", "1.167");

        assert_eq!(table.dates(), ["2018-11-26", "2018-08-29"]);
        assert_eq!(table.latest(), Some("2018-11-26"));
        assert_eq!(table.get("2018-08-29"), Some(&raw(&[("USD", "1.167")])));
    }
}
