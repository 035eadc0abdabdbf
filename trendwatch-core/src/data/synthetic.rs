//! Synthetic price source for offline runs.
//!
//! Produces a seeded random walk of weekday closes starting at 100.0. The
//! same seed and symbol always produce the same table.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{FetchError, PriceSource, PriceTable, CLOSE};

#[derive(Debug, Clone, Copy)]
pub struct SyntheticSource {
    seed: u64,
}

impl SyntheticSource {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn rng_for(&self, symbol: &str) -> StdRng {
        let mixed = symbol
            .bytes()
            .fold(self.seed, |acc, b| acc.rotate_left(5) ^ u64::from(b));
        StdRng::seed_from_u64(mixed)
    }
}

impl PriceSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceTable, FetchError> {
        let mut rng = self.rng_for(symbol);
        let mut price = 100.0_f64;
        let mut dates = Vec::new();
        let mut closes = Vec::new();

        for current in start.iter_days().take_while(|d| *d <= end) {
            if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                continue;
            }
            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            price *= 1.0 + daily_return;
            dates.push(current);
            closes.push(Some(price));
        }

        Ok(PriceTable::new(dates).with_column(CLOSE, closes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        )
    }

    #[test]
    fn skips_weekends() {
        let (start, end) = window();
        let table = SyntheticSource::new(7).fetch("SPY", start, end).unwrap();

        // June 2024 has 20 weekdays
        assert_eq!(table.row_count(), 20);
        assert!(table
            .dates()
            .iter()
            .all(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun)));
    }

    #[test]
    fn deterministic_per_seed_and_symbol() {
        let (start, end) = window();
        let a = SyntheticSource::new(7).fetch("SPY", start, end).unwrap();
        let b = SyntheticSource::new(7).fetch("SPY", start, end).unwrap();
        let c = SyntheticSource::new(7).fetch("QQQ", start, end).unwrap();

        assert_eq!(a, b);
        assert_ne!(a.column(CLOSE), c.column(CLOSE));
    }
}
