use crate::core::error::{ConversionError, Result};
use crate::core::rates::RateTable;
use tracing::{debug, instrument};

const GROUP: &str = "Cube";
const TIME: &str = "time";
const CURRENCY: &str = "currency";
const RATE: &str = "rate";

/// Turns an ECB reference-rate document into a [`RateTable`].
///
/// Every `Cube` element carrying a `time` attribute opens a reference date;
/// every `Cube` carrying both `currency` and `rate` is a rate of the date
/// opened last. Values are kept as found.
pub struct RateTableParser {
    document: String,
    table: Option<RateTable>,
}

impl RateTableParser {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            table: None,
        }
    }

    /// Walks the document on the first call and returns the memoized table afterwards.
    pub fn parse(&mut self) -> Result<&RateTable> {
        let table = match self.table.take() {
            Some(table) => table,
            None => walk(&self.document)?,
        };
        Ok(self.table.insert(table))
    }

    pub fn into_table(mut self) -> Result<RateTable> {
        self.parse()?;
        Ok(self.table.take().unwrap_or_default())
    }
}

#[instrument(skip(document), fields(bytes = document.len()))]
fn walk(document: &str) -> Result<RateTable> {
    let doc = roxmltree::Document::parse(document)
        .map_err(|e| ConversionError::MalformedDocument(e.to_string()))?;

    let mut table = RateTable::new();
    let mut current: Option<&str> = None;
    for node in doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == GROUP)
    {
        if let Some(time) = node.attribute(TIME) {
            table.start_date(time);
            current = Some(time);
        }
        if let (Some(currency), Some(rate)) = (node.attribute(CURRENCY), node.attribute(RATE)) {
            match current {
                Some(date) => table.push_rate(date, currency, rate),
                None => debug!("Skipping rate for {} outside of a dated block", currency),
            }
        }
    }

    debug!(dates = table.len(), "Parsed rate document");
    Ok(table)
}
