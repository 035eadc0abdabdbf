//! CSV export of a fetched series, named by symbol and date.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::Series;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export for {symbol}: series is empty")]
    EmptySeries { symbol: String },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// `{symbol}_{YYYY-MM-DD}.csv`, with path separators in the symbol replaced.
pub fn export_file_name(symbol: &str, date: NaiveDate) -> String {
    let safe: String = symbol
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    format!("{safe}_{}.csv", date.format("%Y-%m-%d"))
}

/// Render a series as CSV text with a `Date,Value` header.
pub fn series_csv(series: &Series) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["Date", "Value"])?;
    for obs in series {
        wtr.write_record([obs.date.format("%Y-%m-%d").to_string(), obs.value.to_string()])?;
    }
    let data = wtr
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// Write `series` into `dir`, creating it if needed, and return the file path.
pub fn export_series(
    series: &Series,
    symbol: &str,
    date: NaiveDate,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    if series.is_empty() {
        return Err(ExportError::EmptySeries {
            symbol: symbol.to_string(),
        });
    }

    let path = dir.join(export_file_name(symbol, date));
    let io_err = |source| ExportError::Io {
        path: path.clone(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;
    let text = series_csv(series)?;
    std::fs::write(&path, text).map_err(io_err)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Observation;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, day).unwrap()
    }

    #[test]
    fn file_name_uses_symbol_and_date() {
        assert_eq!(export_file_name("PETR4.SA", date(3)), "PETR4.SA_2024-10-03.csv");
        assert_eq!(export_file_name("BRK/B", date(3)), "BRK_B_2024-10-03.csv");
    }

    #[test]
    fn writes_two_column_csv() {
        let dir = tempfile::tempdir().unwrap();
        let series = Series::from_observations([
            Observation::new(date(1), 36.5),
            Observation::new(date(2), 37.0),
        ])
        .unwrap();

        let path = export_series(&series, "PETR4.SA", date(2), &dir.path().join("downloads")).unwrap();
        assert!(path.ends_with("downloads/PETR4.SA_2024-10-02.csv"));
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "Date,Value\n2024-10-01,36.5\n2024-10-02,37\n"
        );
    }

    #[test]
    fn empty_series_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let err = export_series(&Series::new(), "X", date(1), dir.path()).unwrap_err();
        assert!(matches!(err, ExportError::EmptySeries { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
