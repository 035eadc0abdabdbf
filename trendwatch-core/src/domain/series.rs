//! Observation and Series — the canonical two-column price series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One sampled price point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Rejected observations when building a series.
#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("observation on {date} does not follow last date {last}")]
    OutOfOrder { date: NaiveDate, last: NaiveDate },

    #[error("invalid value {value} on {date}: must be finite and non-negative")]
    InvalidValue { date: NaiveDate, value: f64 },
}

/// Chronologically ordered observations.
///
/// Dates are strictly increasing and values are finite and non-negative.
/// Insertion order is chronological order; the only mutation is `push`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    observations: Vec<Observation>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from observations, validating every one.
    pub fn from_observations(
        observations: impl IntoIterator<Item = Observation>,
    ) -> Result<Self, SeriesError> {
        let mut series = Self::new();
        for obs in observations {
            series.push(obs)?;
        }
        Ok(series)
    }

    /// Append an observation after the current tail.
    pub fn push(&mut self, obs: Observation) -> Result<(), SeriesError> {
        if !obs.value.is_finite() || obs.value < 0.0 {
            return Err(SeriesError::InvalidValue {
                date: obs.date,
                value: obs.value,
            });
        }
        if let Some(last) = self.observations.last() {
            if obs.date <= last.date {
                return Err(SeriesError::OutOfOrder {
                    date: obs.date,
                    last: last.date,
                });
            }
        }
        self.observations.push(obs);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    pub fn as_slice(&self) -> &[Observation] {
        &self.observations
    }

    /// Values in chronological order.
    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}
