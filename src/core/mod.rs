//! Core domain: money, rate sets, the rate-set cache and the conversion

pub mod cache;
pub mod config;
pub mod converter;
pub mod error;
pub mod log;
pub mod money;
pub mod rates;

// Re-export main types for cleaner imports
pub use cache::Cache;
pub use converter::{ConversionResult, convert};
pub use error::ConversionError;
pub use money::{BASE_CURRENCY, Money};
pub use rates::{RateSet, RateTable};
