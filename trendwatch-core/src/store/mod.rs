//! Append-only observation log with whole-snapshot persistence.
//!
//! The log is a CSV file with header `Date,Value,Status`. It is read in full
//! and rewritten in full on every save; there is no in-place row append. A
//! save writes a sibling temporary file and renames it over the log.
//!
//! Single writer only: concurrent collectors against the same file need an
//! external lock.

pub mod collector;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Observation, Series, SeriesError, StepStatus};

pub use collector::{collect_one_point, CollectOutcome};

const HEADER: [&str; 3] = ["Date", "Value", "Status"];
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV error on {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed log {path} at line {line}: {reason}")]
    MalformedLog {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("date overflow after {0}")]
    DateOverflow(NaiveDate),
}

/// One persisted row: an observation plus its step status.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogRow {
    pub date: NaiveDate,
    pub value: f64,
    pub status: StepStatus,
}

impl LogRow {
    pub fn observation(&self) -> Observation {
        Observation::new(self.date, self.value)
    }
}

/// Handle to the durable log file.
#[derive(Debug, Clone)]
pub struct SeriesLog {
    path: PathBuf,
}

impl SeriesLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file or zero bytes.
    pub fn is_blank(&self) -> Result<bool, StoreError> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len() == 0),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Read every row. A blank log reads as no rows.
    pub fn load(&self) -> Result<Vec<LogRow>, StoreError> {
        if self.is_blank()? {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| self.csv_error(e))?;
        let headers = reader.headers().map_err(|e| self.csv_error(e))?.clone();
        if headers.iter().map(str::trim).ne(HEADER) {
            return Err(self.malformed(1, format!("unexpected header {:?}", headers)));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| self.csv_error(e))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            rows.push(self.parse_row(&record, line)?);
        }
        Ok(rows)
    }

    fn parse_row(&self, record: &csv::StringRecord, line: u64) -> Result<LogRow, StoreError> {
        let field = |i: usize| record.get(i).map(str::trim).unwrap_or("");

        let date = NaiveDate::parse_from_str(field(0), DATE_FORMAT)
            .map_err(|e| self.malformed(line, format!("bad date '{}': {e}", field(0))))?;
        let value = field(1)
            .parse::<f64>()
            .map_err(|e| self.malformed(line, format!("bad value '{}': {e}", field(1))))?;
        let status = field(2)
            .parse::<StepStatus>()
            .map_err(|e| self.malformed(line, e))?;

        Ok(LogRow {
            date,
            value,
            status,
        })
    }

    /// Replace the whole log with `rows`.
    pub fn save(&self, rows: &[LogRow]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let tmp = self.tmp_path();
        let result = self
            .write_snapshot(&tmp, rows)
            .and_then(|()| fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e)));
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }

    fn write_snapshot(&self, tmp: &Path, rows: &[LogRow]) -> Result<(), StoreError> {
        let mut wtr = csv::Writer::from_path(tmp).map_err(|e| self.csv_error(e))?;
        wtr.write_record(HEADER).map_err(|e| self.csv_error(e))?;
        for row in rows {
            wtr.write_record([
                row.date.format(DATE_FORMAT).to_string(),
                row.value.to_string(),
                row.status.to_string(),
            ])
            .map_err(|e| self.csv_error(e))?;
        }
        wtr.flush().map_err(|e| self.io_error(e))
    }

    /// The logged observations as a validated series.
    pub fn series(&self) -> Result<Series, StoreError> {
        let rows = self.load()?;
        Series::from_observations(rows.iter().map(LogRow::observation))
            .map_err(|e: SeriesError| self.malformed(0, e.to_string()))
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn csv_error(&self, source: csv::Error) -> StoreError {
        StoreError::Csv {
            path: self.path.clone(),
            source,
        }
    }

    fn malformed(&self, line: u64, reason: impl Into<String>) -> StoreError {
        StoreError::MalformedLog {
            path: self.path.clone(),
            line,
            reason: reason.into(),
        }
    }
}
