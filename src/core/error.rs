//! Error kinds surfaced by the rate pipeline and the conversion.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConversionError {
    /// Local file or remote fetch failure.
    #[error("{0}")]
    Io(String),

    /// The rate document is not XML or holds no usable reference dates.
    #[error("malformed rate document: {0}")]
    MalformedDocument(String),

    #[error("invalid reference date '{input}', use YYYY-MM-DD{}", list_suffix(.available))]
    DateFormat {
        input: String,
        available: Vec<String>,
    },

    #[error("unknown reference date '{date}'{}", list_suffix(.available))]
    UnknownDate {
        date: String,
        available: Vec<String>,
    },

    #[error("invalid currency, use one of these: {}", .valid.join(", "))]
    Currency { code: String, valid: Vec<String> },

    /// Non-numeric or non-positive rate inside the source document.
    #[error("invalid rate '{value}' for currency {currency}")]
    RateValue { currency: String, value: String },

    #[error("invalid amount '{0}'")]
    Amount(String),
}

fn list_suffix(available: &[String]) -> String {
    if available.is_empty() {
        String::new()
    } else {
        format!(", available dates: {}", available.join(", "))
    }
}

impl ConversionError {
    /// Short name used as the key of an error payload.
    pub fn kind(&self) -> &'static str {
        match self {
            ConversionError::Io(_) | ConversionError::MalformedDocument(_) => "IOError",
            ConversionError::DateFormat { .. } | ConversionError::UnknownDate { .. } => {
                "DateFormatError"
            }
            ConversionError::Currency { .. } => "CurrencyError",
            ConversionError::RateValue { .. } => "RateValueError",
            ConversionError::Amount(_) => "ValueError",
        }
    }

    /// Whether the caller can fix the request and retry.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ConversionError::DateFormat { .. }
                | ConversionError::UnknownDate { .. }
                | ConversionError::Currency { .. }
                | ConversionError::Amount(_)
        )
    }

    /// Attaches the list of known dates to a date error raised without it.
    pub fn with_available_dates(self, dates: Vec<String>) -> Self {
        match self {
            ConversionError::DateFormat { input, .. } => ConversionError::DateFormat {
                input,
                available: dates,
            },
            ConversionError::UnknownDate { date, .. } => ConversionError::UnknownDate {
                date,
                available: dates,
            },
            other => other,
        }
    }
}

impl From<reqwest::Error> for ConversionError {
    fn from(err: reqwest::Error) -> Self {
        ConversionError::Io(err.to_string())
    }
}

pub type Result<T, E = ConversionError> = std::result::Result<T, E>;
