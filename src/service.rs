//! Composition root tying the document source, the parsed table and the cache together.

use crate::core::cache::Cache;
use crate::core::config::{AppConfig, RequestDefaults};
use crate::core::converter::{self, ConversionResult};
use crate::core::error::{ConversionError, Result};
use crate::core::money::Money;
use crate::core::rates::{RateSet, RateTable, parse_reference_date};
use crate::providers::{EcbDocumentSource, RateDocumentSource, RateTableParser};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// One conversion request; missing fields fall back to [`RequestDefaults`].
#[derive(Debug, Clone, Default)]
pub struct ConversionRequest {
    pub amount: Option<String>,
    pub source_currency: Option<String>,
    pub destination_currency: Option<String>,
    /// `YYYY-MM-DD`; the most recent date when absent.
    pub reference_date: Option<String>,
    pub force_refresh: bool,
}

pub struct RateService {
    source: Arc<dyn RateDocumentSource>,
    table: RwLock<Arc<RateTable>>,
    cache: Cache<String, Arc<RateSet>>,
    defaults: RequestDefaults,
}

impl RateService {
    pub fn new(
        source: Arc<dyn RateDocumentSource>,
        capacity: usize,
        defaults: RequestDefaults,
    ) -> Self {
        Self {
            source,
            table: RwLock::new(Arc::new(RateTable::new())),
            cache: Cache::with_capacity(capacity),
            defaults,
        }
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let source = EcbDocumentSource::new(
            &config.source.url,
            config.document_path()?,
            Duration::from_secs(config.source.timeout_secs),
        )?;
        Ok(Self::new(
            Arc::new(source),
            config.cache.capacity,
            config.defaults.clone(),
        ))
    }

    /// Loads the local document (fetching it if missing) and parses it.
    pub async fn initialize(&self) -> Result<()> {
        self.load(false).await
    }

    /// Re-downloads the document and drops every cached rate set.
    pub async fn refresh(&self) -> Result<()> {
        self.load(true).await?;
        self.cache.clear().await;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn load(&self, force_refresh: bool) -> Result<()> {
        let table = self.fetch_table(force_refresh).await?;
        *self.table.write().await = Arc::new(table);
        Ok(())
    }

    async fn fetch_table(&self, force_refresh: bool) -> Result<RateTable> {
        let document = self.source.fetch(force_refresh).await?;
        let table = RateTableParser::new(document).into_table()?;
        if table.is_empty() {
            return Err(ConversionError::MalformedDocument(
                "no reference dates found".to_string(),
            ));
        }
        info!(
            dates = table.len(),
            latest = table.latest().unwrap_or_default(),
            "Loaded rate table"
        );
        Ok(table)
    }

    /// Returns the loaded table, loading it on first use.
    ///
    /// The first load happens under the write lock so concurrent callers
    /// wait for one fetch instead of starting their own.
    async fn current_table(&self) -> Result<Arc<RateTable>> {
        {
            let table = self.table.read().await;
            if !table.is_empty() {
                return Ok(Arc::clone(&*table));
            }
        }
        let mut table = self.table.write().await;
        if table.is_empty() {
            debug!("Rate table not loaded yet");
            *table = Arc::new(self.fetch_table(false).await?);
        }
        Ok(Arc::clone(&*table))
    }

    /// Available reference dates, most recent first.
    pub async fn available_dates(&self) -> Result<Vec<String>> {
        Ok(self.current_table().await?.dates().to_vec())
    }

    /// Rate set of `reference_date`, or of the most recent date when `None`.
    pub async fn rates_for(&self, reference_date: Option<&str>) -> Result<Arc<RateSet>> {
        let table = self.current_table().await?;
        match reference_date.map(str::trim).filter(|d| !d.is_empty()) {
            Some(date) => {
                parse_reference_date(date)
                    .map_err(|e| e.with_available_dates(table.dates().to_vec()))?;
                self.cached_rate_set(date).await
            }
            None => {
                let latest = table.latest().unwrap_or_default();
                // A bad date here comes from the document, not from the caller.
                parse_reference_date(latest).map_err(|_| {
                    ConversionError::MalformedDocument(format!(
                        "latest reference date '{latest}' is not YYYY-MM-DD"
                    ))
                })?;
                self.cached_rate_set(latest).await
            }
        }
    }

    /// Builds a missing rate set from the table current at load time, so a
    /// set loaded while a refresh swaps the table never outlives the clear.
    async fn cached_rate_set(&self, date: &str) -> Result<Arc<RateSet>> {
        let current = &self.table;
        self.cache
            .get(&date.to_string(), |key| async move {
                let table = Arc::clone(&*current.read().await);
                let Some(raw) = table.get(&key) else {
                    return Err(ConversionError::UnknownDate {
                        date: key,
                        available: table.dates().to_vec(),
                    });
                };
                RateSet::from_raw(&key, raw)
                    .map(Arc::new)
                    .map_err(|e| e.with_available_dates(table.dates().to_vec()))
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn convert(&self, request: &ConversionRequest) -> Result<ConversionResult> {
        if request.force_refresh {
            self.refresh().await?;
        }
        let rates = self.rates_for(request.reference_date.as_deref()).await?;

        let amount = or_default(&request.amount, &self.defaults.amount);
        let source = or_default(&request.source_currency, &self.defaults.source_currency);
        let destination = or_default(
            &request.destination_currency,
            &self.defaults.destination_currency,
        );
        let money = Money::new(source, amount)?;
        converter::convert(&money, destination, &rates)
    }

    pub async fn cached_rate_sets(&self) -> usize {
        self.cache.len().await
    }
}

fn or_default<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}
