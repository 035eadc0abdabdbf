//! TOML configuration for the pipeline and the collector.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::RetryPolicy;
use crate::trend::TrendRule;

/// Longest fetch window accepted from a config file (about a century).
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendWatchConfig {
    pub pipeline: PipelineConfig,
    pub store: StoreConfig,
}

/// Fetch window, retry budget and classification windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub lookback_days: i64,
    pub max_attempts: u32,
    pub backoff_secs: u64,
    pub window: usize,
    pub min_points: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let rule = TrendRule::default();
        Self {
            lookback_days: 30,
            max_attempts: 3,
            backoff_secs: 10,
            window: rule.window,
            min_points: rule.min_points,
        }
    }
}

impl PipelineConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.max_attempts, Duration::from_secs(self.backoff_secs))
    }

    /// Default thresholds with this config's window sizes.
    pub fn trend_rule(&self) -> TrendRule {
        TrendRule {
            window: self.window,
            min_points: self.min_points,
            ..TrendRule::default()
        }
    }
}

/// Collector log location and synthetic value ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub log_path: PathBuf,
    pub seed_days: u32,
    pub seed_min: i64,
    pub seed_max: i64,
    pub max_step: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("dados.csv"),
            seed_days: 7,
            seed_min: 2000,
            seed_max: 3000,
            max_step: 150,
        }
    }
}

impl TrendWatchConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.pipeline;
        if p.max_attempts == 0 {
            return Err(ConfigError::Invalid("pipeline.max_attempts must be at least 1".into()));
        }
        if p.lookback_days <= 0 || p.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(ConfigError::Invalid(format!(
                "pipeline.lookback_days ({}) must be between 1 and {MAX_LOOKBACK_DAYS}",
                p.lookback_days
            )));
        }
        if p.window == 0 {
            return Err(ConfigError::Invalid("pipeline.window must be at least 1".into()));
        }
        if p.min_points < 2 * p.window {
            return Err(ConfigError::Invalid(format!(
                "pipeline.min_points ({}) must cover two windows of {}",
                p.min_points, p.window
            )));
        }

        let s = &self.store;
        if s.seed_min > s.seed_max {
            return Err(ConfigError::Invalid(format!(
                "store.seed_min ({}) exceeds store.seed_max ({})",
                s.seed_min, s.seed_max
            )));
        }
        if s.seed_min < 0 {
            return Err(ConfigError::Invalid("store.seed_min must be non-negative".into()));
        }
        if s.max_step < 0 {
            return Err(ConfigError::Invalid("store.max_step must be non-negative".into()));
        }
        Ok(())
    }
}
