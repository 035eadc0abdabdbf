//! Trend labels (derived per request) and step statuses (persisted per row).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discrete classification of the recent trend of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrendLabel {
    StrongUp,
    SlightUp,
    StrongDown,
    SlightDown,
    Stable,
    AwaitingData,
    Error,
}

impl TrendLabel {
    pub const ALL: [TrendLabel; 7] = [
        TrendLabel::StrongUp,
        TrendLabel::SlightUp,
        TrendLabel::StrongDown,
        TrendLabel::SlightDown,
        TrendLabel::Stable,
        TrendLabel::AwaitingData,
        TrendLabel::Error,
    ];

    /// Short display name.
    pub fn name(self) -> &'static str {
        match self {
            TrendLabel::StrongUp => "Strong Up",
            TrendLabel::SlightUp => "Slight Up",
            TrendLabel::StrongDown => "Strong Down",
            TrendLabel::SlightDown => "Slight Down",
            TrendLabel::Stable => "Stable",
            TrendLabel::AwaitingData => "Awaiting Data",
            TrendLabel::Error => "Error",
        }
    }

    /// Fixed analysis sentence shown next to the label.
    pub fn analysis(self) -> &'static str {
        match self {
            TrendLabel::StrongUp => {
                "The value trend is a **strong rise** over the last few days. \
                 The market is heated and the recommendation is to take advantage of the moment."
            }
            TrendLabel::SlightUp => {
                "The value trend is a **slight rise** over the last few days. \
                 Gradual increases may signal a growing market."
            }
            TrendLabel::StrongDown => {
                "The value trend is a **strong fall** over the last few days. \
                 **Caution** and in-depth analysis are recommended."
            }
            TrendLabel::SlightDown => {
                "The value trend is a **slight fall** over the last few days. \
                 Keep an eye on the swings and avoid hasty decisions."
            }
            TrendLabel::Stable => {
                "The value trend is **stable** over the last few days. \
                 There are no large swings, indicating a calm market."
            }
            TrendLabel::AwaitingData => "Trend analysis available after 10 data entries.",
            TrendLabel::Error => {
                "Error: could not load data. Check your internet connection or the ticker symbol."
            }
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-row status in the incremental store, relative to the previous row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepStatus {
    Stable,
    Increase,
    Decrease,
}

impl StepStatus {
    /// Status of `current` against `previous`.
    pub fn between(previous: f64, current: f64) -> Self {
        if current > previous {
            StepStatus::Increase
        } else if current < previous {
            StepStatus::Decrease
        } else {
            StepStatus::Stable
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Stable => "Stable",
            StepStatus::Increase => "Increase",
            StepStatus::Decrease => "Decrease",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Stable" => Ok(StepStatus::Stable),
            "Increase" => Ok(StepStatus::Increase),
            "Decrease" => Ok(StepStatus::Decrease),
            other => Err(format!("unknown step status '{other}'")),
        }
    }
}
