//! Yahoo Finance price source.
//!
//! Fetches daily quotes from Yahoo's v8 chart API and exposes them as a
//! `PriceTable` with `open`, `high`, `low`, `close` and `adjclose` columns.
//! Any of those may be missing from a response; choosing among them is the
//! normalizer's job. One call is one HTTP request; retries belong to the
//! pipeline.

use std::time::Duration;

use chrono::NaiveDate;
use log::debug;
use reqwest::Url;
use serde::Deserialize;

use super::provider::{FetchError, PriceSource, PriceTable, ADJ_CLOSE, CLOSE};

const CHART_ENDPOINT: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance price source.
pub struct YahooSource {
    client: reqwest::blocking::Client,
}

impl YahooSource {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| FetchError::NetworkUnreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Build the chart API URL for a symbol and date range.
    ///
    /// The symbol is percent-encoded as a single path segment.
    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Url, FetchError> {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end
            .succ_opt()
            .unwrap_or(end)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp();

        let mut url = Url::parse(CHART_ENDPOINT)
            .map_err(|e| FetchError::InvalidRequest(format!("bad chart endpoint: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| FetchError::InvalidRequest("chart endpoint cannot take a path".into()))?
            .push(symbol);
        url.query_pairs_mut()
            .append_pair("period1", &start_ts.to_string())
            .append_pair("period2", &end_ts.to_string())
            .append_pair("interval", "1d")
            .append_pair("includeAdjustedClose", "true");
        Ok(url)
    }

    /// Convert the chart API response into a table.
    ///
    /// A result with no timestamps is returned as an empty table, not an error.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<PriceTable, FetchError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    FetchError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    FetchError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
                }
            } else {
                FetchError::ResponseFormatChanged("empty result with no error".into())
            }
        })?;

        let Some(data) = result.into_iter().next() else {
            return Ok(PriceTable::default());
        };

        let timestamps = data.timestamp.unwrap_or_default();
        let dates = timestamps
            .iter()
            .map(|&ts| {
                chrono::DateTime::from_timestamp(ts, 0)
                    .map(|dt| dt.naive_utc().date())
                    .ok_or_else(|| {
                        FetchError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
        let adj_close = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let mut table = PriceTable::new(dates);
        for (name, column) in [
            ("open", quote.open),
            ("high", quote.high),
            ("low", quote.low),
            (CLOSE, quote.close),
            (ADJ_CLOSE, adj_close),
        ] {
            if let Some(values) = column {
                table = table.with_column(name, values);
            }
        }

        Ok(table)
    }
}

impl PriceSource for YahooSource {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceTable, FetchError> {
        let url = Self::chart_url(symbol, start, end)?;
        debug!("GET {url}");

        let resp = self.client.get(url).send().map_err(|e| {
            FetchError::NetworkUnreachable(e.to_string())
        })?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(FetchError::RateLimited {
                retry_after_secs: retry_after,
            });
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                symbol: symbol.to_string(),
            });
        }

        let chart: ChartResponse = resp.json().map_err(|e| {
            FetchError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })?;

        Self::parse_response(symbol, chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<PriceTable, FetchError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooSource::parse_response("PETR4.SA", resp)
    }

    #[test]
    fn url_covers_whole_end_day() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let url = YahooSource::chart_url("PETR4.SA", start, end).unwrap();
        let url = url.as_str();

        assert!(url.starts_with("https://query2.finance.yahoo.com/v8/finance/chart/PETR4.SA?"));
        assert!(url.contains("period1=1704067200"));
        assert!(url.contains("period2=1706745600"));
        assert!(url.contains("interval=1d"));
    }

    #[test]
    fn url_encodes_symbol_as_one_segment() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        for (symbol, encoded) in [("BRK/B", "BRK%2FB"), ("A?B#C", "A%3FB%23C")] {
            let url = YahooSource::chart_url(symbol, day, day).unwrap();
            assert_eq!(
                url.path(),
                format!("/v8/finance/chart/{encoded}"),
                "symbol {symbol}"
            );
            assert_eq!(url.query_pairs().count(), 4);
            assert!(url.fragment().is_none());
        }
    }

    #[test]
    fn parses_close_and_adjclose_columns() {
        let table = parse(
            r#"{"chart":{"result":[{
                "timestamp":[1704205800,1704292200],
                "indicators":{
                    "quote":[{"open":[1.0,2.0],"high":[1.5,2.5],"low":[0.5,1.5],"close":[1.2,null]}],
                    "adjclose":[{"adjclose":[1.1,2.1]}]
                }}],"error":null}}"#,
        )
        .unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.dates()[0], NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(table.column(CLOSE), Some(&[Some(1.2), None][..]));
        assert_eq!(table.column(ADJ_CLOSE), Some(&[Some(1.1), Some(2.1)][..]));
    }

    #[test]
    fn missing_close_leaves_column_out() {
        let table = parse(
            r#"{"chart":{"result":[{
                "timestamp":[1704205800],
                "indicators":{"quote":[{}],"adjclose":[{"adjclose":[3.0]}]}
            }],"error":null}}"#,
        )
        .unwrap();

        assert!(table.column(CLOSE).is_none());
        assert!(table.column(ADJ_CLOSE).is_some());
    }

    #[test]
    fn no_timestamps_is_an_empty_table() {
        let table = parse(
            r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#,
        )
        .unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn not_found_maps_to_symbol_error() {
        let err = parse(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, FetchError::SymbolNotFound { .. }));
    }
}
