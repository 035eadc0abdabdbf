//! One collector step: seed a blank log, or append one derived observation.

use chrono::{Duration, NaiveDate};
use log::info;
use rand::Rng;

use super::{LogRow, SeriesLog, StoreError};
use crate::config::StoreConfig;
use crate::domain::StepStatus;

/// What a collector invocation did to the log.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectOutcome {
    /// The log was blank and now holds `rows` synthetic observations.
    Seeded { rows: usize },
    /// One row was appended after the previous last row.
    Appended { row: LogRow },
}

/// Run one collection step against `log`.
///
/// A blank log (missing, zero bytes, or header only) is seeded with
/// `settings.seed_days` daily rows ending the day before `today`, each a
/// uniform integer in `[seed_min, seed_max]` with status `Stable`. Otherwise
/// the last row is the anchor: the new row is dated one day later and moves
/// by a uniform integer in `[-max_step, max_step]`, floored at zero.
///
/// Malformed log content aborts the step before anything is written.
pub fn collect_one_point<R: Rng>(
    log: &SeriesLog,
    settings: &StoreConfig,
    rng: &mut R,
    today: NaiveDate,
) -> Result<CollectOutcome, StoreError> {
    let mut rows = log.load()?;

    let Some(anchor) = rows.last().copied() else {
        info!("seeding {} with {} days of history", log.path().display(), settings.seed_days);
        let seeded = seed_rows(settings, rng, today);
        log.save(&seeded)?;
        return Ok(CollectOutcome::Seeded { rows: seeded.len() });
    };

    let row = next_row(&anchor, settings.max_step, rng)?;
    info!(
        "appending {} = {} ({}) to {}",
        row.date,
        row.value,
        row.status,
        log.path().display()
    );
    rows.push(row);
    log.save(&rows)?;
    Ok(CollectOutcome::Appended { row })
}

fn seed_rows<R: Rng>(settings: &StoreConfig, rng: &mut R, today: NaiveDate) -> Vec<LogRow> {
    let days = i64::from(settings.seed_days);
    let first = today - Duration::days(days);
    (0..days)
        .map(|i| LogRow {
            date: first + Duration::days(i),
            value: rng.gen_range(settings.seed_min..=settings.seed_max) as f64,
            status: StepStatus::Stable,
        })
        .collect()
}

fn next_row<R: Rng>(anchor: &LogRow, max_step: i64, rng: &mut R) -> Result<LogRow, StoreError> {
    let date = anchor
        .date
        .succ_opt()
        .ok_or(StoreError::DateOverflow(anchor.date))?;
    let value = (anchor.value + rng.gen_range(-max_step..=max_step) as f64).max(0.0);
    Ok(LogRow {
        date,
        value,
        status: StepStatus::between(anchor.value, value),
    })
}
