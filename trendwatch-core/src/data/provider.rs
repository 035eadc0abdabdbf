//! Price source trait, raw tabular results, and fetch error types.
//!
//! The PriceSource trait abstracts over where prices come from (Yahoo Finance,
//! a synthetic random walk) so the pipeline can be driven by scripted sources
//! in tests.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;

use super::normalize::NormalizationError;

/// Column name for the exact closing price.
pub const CLOSE: &str = "close";
/// Column name for the adjusted closing price.
pub const ADJ_CLOSE: &str = "adjclose";

/// Raw tabular result of a fetch: one date per row plus named columns.
///
/// Column naming is whatever the source provides; any column may be absent.
/// Cells are optional because providers report holes (non-trading days,
/// missing quotes) as nulls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl PriceTable {
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        Self {
            dates,
            columns: BTreeMap::new(),
        }
    }

    /// Add (or replace) a column. Columns shorter than the date index read as null.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        self.columns.insert(name.into(), values);
        self
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    pub fn row_count(&self) -> usize {
        self.dates.len()
    }

    /// No rows at all. Empty payloads are retried by the pipeline.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Transient fetch failures. All of them are retried by the pipeline.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} for {symbol}")]
    HttpStatus { status: u16, symbol: String },

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("empty payload for {symbol}")]
    EmptyPayload { symbol: String },

    #[error("normalization failed: {0}")]
    Normalization(#[from] NormalizationError),
}

/// A source of daily prices for a symbol over a date range.
pub trait PriceSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch one tabular window of prices. Performs at most one request.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<PriceTable, FetchError>;
}
