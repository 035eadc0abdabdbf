//! Normalization of heterogeneous price tables into a canonical Series.
//!
//! A single closing-price-like field is selected by trying an ordered list of
//! candidate extractors; the first one that finds its field wins. Everything
//! else in the source table is discarded.

use thiserror::Error;

use super::provider::{PriceTable, ADJ_CLOSE, CLOSE};
use crate::domain::{Observation, Series, SeriesError};

#[derive(Debug, Error, PartialEq)]
pub enum NormalizationError {
    #[error("none of the candidate fields [{}] are present", .tried.join(", "))]
    MissingField { tried: Vec<String> },

    #[error("invalid series: {0}")]
    InvalidSeries(#[from] SeriesError),
}

/// Picks one value column out of a price table.
pub trait FieldExtractor: Send + Sync {
    fn name(&self) -> &str;

    /// The column's cells, or `None` if this field is not in the table.
    fn extract<'a>(&self, table: &'a PriceTable) -> Option<&'a [Option<f64>]>;
}

/// Extracts a column by exact name.
#[derive(Debug, Clone)]
pub struct ColumnExtractor {
    column: String,
}

impl ColumnExtractor {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl FieldExtractor for ColumnExtractor {
    fn name(&self) -> &str {
        &self.column
    }

    fn extract<'a>(&self, table: &'a PriceTable) -> Option<&'a [Option<f64>]> {
        table.column(&self.column)
    }
}

/// Ordered candidate extractors; first match wins.
pub struct Normalizer {
    candidates: Vec<Box<dyn FieldExtractor>>,
}

impl Normalizer {
    pub fn new(candidates: Vec<Box<dyn FieldExtractor>>) -> Self {
        Self { candidates }
    }

    /// Exact close first, adjusted close as fallback.
    pub fn closing_price() -> Self {
        Self::new(vec![
            Box::new(ColumnExtractor::new(CLOSE)),
            Box::new(ColumnExtractor::new(ADJ_CLOSE)),
        ])
    }

    pub fn candidate_names(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.name()).collect()
    }

    /// Reshape `table` into a `(date, value)` series using the first matching field.
    ///
    /// Rows whose selected cell is null are skipped.
    pub fn normalize(&self, table: &PriceTable) -> Result<Series, NormalizationError> {
        let values = self
            .candidates
            .iter()
            .find_map(|c| c.extract(table))
            .ok_or_else(|| NormalizationError::MissingField {
                tried: self.candidates.iter().map(|c| c.name().to_string()).collect(),
            })?;

        let observations = table
            .dates()
            .iter()
            .enumerate()
            .filter_map(|(i, &date)| {
                values
                    .get(i)
                    .copied()
                    .flatten()
                    .map(|value| Observation::new(date, value))
            });

        Ok(Series::from_observations(observations)?)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::closing_price()
    }
}
