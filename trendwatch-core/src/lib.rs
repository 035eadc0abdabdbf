//! TrendWatch Core — resilient price ingestion, trend classification, and an
//! incremental observation store.
//!
//! - Price sources (Yahoo Finance, synthetic) behind the `PriceSource` trait
//! - Candidate-field normalization into a canonical `(date, value)` series
//! - Fixed-backoff retry policy decoupled from the call it wraps
//! - Five-way trend classification over the tail of a series
//! - Append-only CSV log with whole-snapshot persistence and per-row status
//! - CSV export named by symbol and date

pub mod config;
pub mod data;
pub mod domain;
pub mod export;
pub mod pipeline;
pub mod store;
pub mod trend;

pub use config::{ConfigError, PipelineConfig, StoreConfig, TrendWatchConfig};
pub use domain::{Observation, Series, StepStatus, TrendLabel};
pub use export::{export_series, ExportError};
pub use pipeline::{IngestionPipeline, TrendReport};
pub use store::{collect_one_point, CollectOutcome, LogRow, SeriesLog, StoreError};
pub use trend::TrendRule;
