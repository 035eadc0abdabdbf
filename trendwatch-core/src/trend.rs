//! Trend classification over the tail of a series.
//!
//! The mean of the last `window` values is compared with the mean of the
//! `window` values immediately before it. The comparisons run in a fixed order
//! and the first match wins, so a ratio sitting exactly on a threshold falls
//! through to the next check.

use serde::{Deserialize, Serialize};

use crate::domain::{Series, TrendLabel};

/// Thresholds and window sizes for trend classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendRule {
    /// Values per averaging window.
    pub window: usize,
    /// Below this many values the label is `AwaitingData`.
    pub min_points: usize,
    pub strong_up: f64,
    pub slight_up: f64,
    pub strong_down: f64,
    pub slight_down: f64,
}

impl Default for TrendRule {
    fn default() -> Self {
        Self {
            window: 5,
            min_points: 10,
            strong_up: 1.05,
            slight_up: 1.01,
            strong_down: 0.95,
            slight_down: 0.99,
        }
    }
}

impl TrendRule {
    /// Classify a series. Never returns `TrendLabel::Error`.
    pub fn classify(&self, series: &Series) -> TrendLabel {
        self.classify_values(&series.values())
    }

    pub fn classify_values(&self, values: &[f64]) -> TrendLabel {
        let needed = self.min_points.max(2 * self.window);
        if self.window == 0 || values.len() < needed {
            return TrendLabel::AwaitingData;
        }

        let n = values.len();
        let recent = mean(&values[n - self.window..]);
        let prior = mean(&values[n - 2 * self.window..n - self.window]);
        self.classify_means(recent, prior)
    }

    /// Pure threshold table over the two window means.
    pub fn classify_means(&self, recent: f64, prior: f64) -> TrendLabel {
        if recent > prior * self.strong_up {
            TrendLabel::StrongUp
        } else if recent > prior * self.slight_up {
            TrendLabel::SlightUp
        } else if recent < prior * self.strong_down {
            TrendLabel::StrongDown
        } else if recent < prior * self.slight_down {
            TrendLabel::SlightDown
        } else {
            TrendLabel::Stable
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Five prior values of 100 followed by five recent values of `recent`.
    fn tail(recent: f64) -> Vec<f64> {
        let mut v = vec![100.0; 5];
        v.extend(std::iter::repeat(recent).take(5));
        v
    }

    fn label(recent: f64) -> TrendLabel {
        TrendRule::default().classify_values(&tail(recent))
    }

    #[test]
    fn fewer_than_ten_points_awaits_data() {
        let rule = TrendRule::default();
        assert_eq!(rule.classify_values(&[]), TrendLabel::AwaitingData);
        assert_eq!(rule.classify_values(&[1.0; 9]), TrendLabel::AwaitingData);
        assert_eq!(rule.classify_values(&[1.0; 10]), TrendLabel::Stable);
    }

    #[test]
    fn strong_up_boundary() {
        assert_eq!(label(105.5), TrendLabel::StrongUp);
        assert_eq!(label(105.0), TrendLabel::SlightUp);
        assert_eq!(label(104.5), TrendLabel::SlightUp);
    }

    #[test]
    fn slight_up_boundary() {
        assert_eq!(label(101.5), TrendLabel::SlightUp);
        assert_eq!(label(101.0), TrendLabel::Stable);
        assert_eq!(label(100.5), TrendLabel::Stable);
    }

    #[test]
    fn slight_down_boundary() {
        assert_eq!(label(99.5), TrendLabel::Stable);
        assert_eq!(label(99.0), TrendLabel::Stable);
        assert_eq!(label(98.5), TrendLabel::SlightDown);
    }

    #[test]
    fn strong_down_boundary() {
        assert_eq!(label(95.5), TrendLabel::SlightDown);
        assert_eq!(label(95.0), TrendLabel::SlightDown);
        assert_eq!(label(94.5), TrendLabel::StrongDown);
    }

    #[test]
    fn only_the_last_ten_values_matter() {
        let rule = TrendRule::default();
        let mut values = vec![1.0; 20];
        values.extend(tail(110.0));
        assert_eq!(rule.classify_values(&values), TrendLabel::StrongUp);
    }

    #[test]
    fn window_means_not_endpoints() {
        // Prior mean 100, recent mean 103 despite a final dip.
        let values = [
            100.0, 100.0, 100.0, 100.0, 100.0, 104.0, 104.0, 104.0, 104.0, 99.0,
        ];
        assert_eq!(
            TrendRule::default().classify_values(&values),
            TrendLabel::SlightUp
        );
    }

    proptest! {
        #[test]
        fn short_series_always_await_data(values in prop::collection::vec(0.0..10_000.0_f64, 0..10)) {
            prop_assert_eq!(TrendRule::default().classify_values(&values), TrendLabel::AwaitingData);
        }

        #[test]
        fn label_depends_only_on_window_means(
            head in prop::collection::vec(0.0..10_000.0_f64, 0..20),
            prior in 1.0..1_000.0_f64,
            ratio in 0.8..1.2_f64,
        ) {
            let recent = prior * ratio;
            let mut values = head;
            values.extend(std::iter::repeat(prior).take(5));
            values.extend(std::iter::repeat(recent).take(5));

            let rule = TrendRule::default();
            let got = rule.classify_values(&values);
            prop_assert_ne!(got, TrendLabel::AwaitingData);
            prop_assert_ne!(got, TrendLabel::Error);
            prop_assert_eq!(got, rule.classify_means(mean(&values[values.len() - 5..]), mean(&values[values.len() - 10..values.len() - 5])));
        }
    }
}
