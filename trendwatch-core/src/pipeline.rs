//! Ingestion pipeline: fetch with retries → normalize → classify.
//!
//! Every fetch-layer failure (network error, empty payload, missing price
//! field) is logged and retried under the configured policy. Running out of
//! attempts is reported as data: an empty series labelled `TrendLabel::Error`.
//! Callers never have to handle an error from `fetch_and_classify`.

use chrono::{Duration, NaiveDate};
use log::{info, warn};
use serde::Serialize;

use crate::data::{
    FetchError, Normalizer, PriceSource, RetryError, RetryPolicy, Sleeper, ThreadSleeper,
};
use crate::domain::{Series, TrendLabel};
use crate::trend::TrendRule;

/// Outcome of one fetch-and-classify request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub symbol: String,
    pub series: Series,
    pub analysis: String,
    pub label: TrendLabel,
}

impl TrendReport {
    /// Classify a successfully fetched series.
    pub fn from_series(symbol: &str, series: Series, rule: &TrendRule) -> Self {
        let label = rule.classify(&series);
        Self {
            symbol: symbol.to_string(),
            series,
            analysis: label.analysis().to_string(),
            label,
        }
    }

    /// The terminal result after the retry budget is spent.
    pub fn unavailable(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            series: Series::new(),
            analysis: TrendLabel::Error.analysis().to_string(),
            label: TrendLabel::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.label == TrendLabel::Error
    }
}

/// Fetches a trailing window for one symbol and classifies its trend.
pub struct IngestionPipeline {
    source: Box<dyn PriceSource>,
    sleeper: Box<dyn Sleeper>,
    normalizer: Normalizer,
    policy: RetryPolicy,
    rule: TrendRule,
    lookback_days: i64,
}

impl IngestionPipeline {
    /// Pipeline with the default policy: 30-day window, 3 attempts, 10s backoff.
    pub fn new(source: Box<dyn PriceSource>) -> Self {
        Self {
            source,
            sleeper: Box::new(ThreadSleeper),
            normalizer: Normalizer::closing_price(),
            policy: RetryPolicy::default(),
            rule: TrendRule::default(),
            lookback_days: 30,
        }
    }

    pub fn with_sleeper(mut self, sleeper: Box<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_rule(mut self, rule: TrendRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Fetch the window ending today and classify it.
    pub fn fetch_and_classify(&self, symbol: &str) -> TrendReport {
        self.fetch_and_classify_at(symbol, chrono::Local::now().date_naive())
    }

    /// Fetch the window ending on `today` and classify it.
    pub fn fetch_and_classify_at(&self, symbol: &str, today: NaiveDate) -> TrendReport {
        match self.fetch_series(symbol, today) {
            Ok(series) => {
                info!("downloaded {} observations for {symbol}", series.len());
                TrendReport::from_series(symbol, series, &self.rule)
            }
            Err(e) => {
                warn!("no data for {symbol}: {e}");
                TrendReport::unavailable(symbol)
            }
        }
    }

    /// Fetch and normalize under the retry policy.
    ///
    /// A window that cannot be represented as a date range fails with zero
    /// attempts.
    pub fn fetch_series(
        &self,
        symbol: &str,
        today: NaiveDate,
    ) -> Result<Series, RetryError<FetchError>> {
        let start = Duration::try_days(self.lookback_days)
            .filter(|window| *window >= Duration::zero())
            .and_then(|window| today.checked_sub_signed(window))
            .ok_or_else(|| RetryError {
                attempts: 0,
                last: FetchError::InvalidRequest(format!(
                    "{} days before {today}",
                    self.lookback_days
                )),
            })?;
        info!(
            "fetching {symbol} from {} ({start} to {today})",
            self.source.name()
        );

        self.policy.run(self.sleeper.as_ref(), |_attempt| -> Result<Series, FetchError> {
            let table = self.source.fetch(symbol, start, today)?;
            if table.is_empty() {
                return Err(FetchError::EmptyPayload {
                    symbol: symbol.to_string(),
                });
            }
            Ok(self.normalizer.normalize(&table)?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::{PriceTable, ADJ_CLOSE, CLOSE};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration as StdDuration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 31).unwrap()
    }

    fn table(closes: &[f64]) -> PriceTable {
        let dates = (0..closes.len() as i64)
            .map(|i| NaiveDate::from_ymd_opt(2024, 7, 1).unwrap() + Duration::days(i))
            .collect();
        PriceTable::new(dates).with_column(CLOSE, closes.iter().map(|&c| Some(c)).collect())
    }

    /// Replays scripted responses in order, then repeats the last one.
    struct ScriptedSource {
        responses: Mutex<Vec<Result<PriceTable, FetchError>>>,
        calls: Arc<AtomicU32>,
    }

    impl ScriptedSource {
        fn new(mut responses: Vec<Result<PriceTable, FetchError>>) -> (Self, Arc<AtomicU32>) {
            responses.reverse();
            let calls = Arc::new(AtomicU32::new(0));
            (
                Self {
                    responses: Mutex::new(responses),
                    calls: Arc::clone(&calls),
                },
                calls,
            )
        }
    }

    impl PriceSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        fn fetch(&self, symbol: &str, _: NaiveDate, _: NaiveDate) -> Result<PriceTable, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            match responses.pop() {
                Some(r) => r,
                None => Err(FetchError::SymbolNotFound {
                    symbol: symbol.to_string(),
                }),
            }
        }
    }

    #[derive(Clone, Default)]
    struct CountingSleeper(Arc<AtomicU32>);

    impl Sleeper for CountingSleeper {
        fn sleep(&self, _: StdDuration) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn pipeline(source: ScriptedSource) -> (IngestionPipeline, Arc<AtomicU32>) {
        let sleeper = CountingSleeper::default();
        let sleeps = Arc::clone(&sleeper.0);
        (
            IngestionPipeline::new(Box::new(source)).with_sleeper(Box::new(sleeper)),
            sleeps,
        )
    }

    #[test]
    fn two_failures_then_success() {
        let (source, calls) = ScriptedSource::new(vec![
            Err(FetchError::NetworkUnreachable("down".into())),
            Ok(PriceTable::default()),
            Ok(table(&[100.0; 12])),
        ]);
        let (pipeline, sleeps) = pipeline(source);

        let report = pipeline.fetch_and_classify_at("SPY", today());
        assert_eq!(report.label, TrendLabel::Stable);
        assert_eq!(report.series.len(), 12);
        assert!(!report.is_error());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(sleeps.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn three_failures_yield_error_report() {
        let (source, calls) = ScriptedSource::new(vec![
            Err(FetchError::NetworkUnreachable("down".into())),
            Ok(PriceTable::default()),
            Ok(PriceTable::new(vec![today()]).with_column("open", vec![Some(1.0)])),
            Ok(table(&[100.0; 12])),
        ]);
        let (pipeline, sleeps) = pipeline(source);

        let report = pipeline.fetch_and_classify_at("SPY", today());
        assert_eq!(report, TrendReport::unavailable("SPY"));
        assert!(report.series.is_empty());
        assert_eq!(report.analysis, TrendLabel::Error.analysis());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(sleeps.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn adjusted_close_fallback_is_used() {
        let adj_only = PriceTable::new(vec![today()]).with_column(ADJ_CLOSE, vec![Some(42.0)]);
        let (source, _) = ScriptedSource::new(vec![Ok(adj_only)]);
        let (pipeline, sleeps) = pipeline(source);

        let report = pipeline.fetch_and_classify_at("SPY", today());
        assert_eq!(report.series.values(), vec![42.0]);
        assert_eq!(report.label, TrendLabel::AwaitingData);
        assert_eq!(report.analysis, TrendLabel::AwaitingData.analysis());
        assert_eq!(sleeps.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn rising_tail_is_classified() {
        let mut closes = vec![100.0; 5];
        closes.extend([110.0; 5]);
        let (source, _) = ScriptedSource::new(vec![Ok(table(&closes))]);
        let (pipeline, _) = pipeline(source);

        assert_eq!(
            pipeline.fetch_and_classify_at("SPY", today()).label,
            TrendLabel::StrongUp
        );
    }

    #[test]
    fn out_of_range_window_yields_error_report() {
        for days in [1_000_000_000, i64::MAX, -1] {
            let (source, calls) = ScriptedSource::new(vec![Ok(table(&[100.0; 12]))]);
            let (pipeline, sleeps) = pipeline(source);
            let pipeline = pipeline.with_lookback_days(days);

            let report = pipeline.fetch_and_classify_at("SPY", today());
            assert_eq!(report, TrendReport::unavailable("SPY"), "lookback {days}");
            assert!(matches!(
                pipeline.fetch_series("SPY", today()),
                Err(RetryError { attempts: 0, last: FetchError::InvalidRequest(_) })
            ));
            assert_eq!(calls.load(Ordering::SeqCst), 0);
            assert_eq!(sleeps.load(Ordering::SeqCst), 0);
        }
    }

    #[test]
    fn custom_policy_budget_is_honored() {
        let (source, calls) = ScriptedSource::new(vec![]);
        let (pipeline, sleeps) = pipeline(source);
        let pipeline = pipeline.with_policy(RetryPolicy::fixed(5, StdDuration::from_secs(1)));

        assert!(pipeline.fetch_and_classify_at("NOPE", today()).is_error());
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(sleeps.load(Ordering::SeqCst), 4);
    }
}
