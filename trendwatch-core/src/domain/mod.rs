//! Domain types: observations, series, trend labels, step statuses.

pub mod label;
pub mod series;

pub use label::{StepStatus, TrendLabel};
pub use series::{Observation, Series, SeriesError};
