//! Batch loading: read planned batches, concatenate, filter to a date window

use crate::data::{BatchPlan, BatchReader};
use crate::error::{DemandError, Result};
use crate::records::TripRecord;
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use tracing::{debug, info, warn};

/// Closed-open pickup window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DateWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if start >= end {
            return Err(DemandError::InvalidParameter(format!(
                "Window start {} must precede end {}",
                start, end
            )));
        }

        Ok(Self { start, end })
    }

    /// Window from midnight of `start` to midnight of `end`
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let midnight = |date: NaiveDate| {
            date.and_hms_opt(0, 0, 0).ok_or_else(|| {
                DemandError::InvalidParameter(format!("No midnight on {}", date))
            })
        };
        Self::new(midnight(start)?, midnight(end)?)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.start <= timestamp && timestamp < self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Row counts gathered while loading
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Rows read per batch, in concatenation order
    pub batch_rows: Vec<(String, usize)>,
    /// Rows read across all batches
    pub rows_read: usize,
    /// Rows whose pickup time is unknown
    pub unknown_pickups: usize,
    /// Rows inside the window
    pub rows_kept: usize,
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Batches read: {}", self.batch_rows.len())?;
        for (batch, rows) in &self.batch_rows {
            writeln!(f, "  {}: {} rows", batch, rows)?;
        }
        writeln!(f, "Rows read: {}", self.rows_read)?;
        writeln!(f, "Rows with unknown pickup: {}", self.unknown_pickups)?;
        write!(f, "Rows in window: {}", self.rows_kept)
    }
}

/// Loaded and window-filtered trip records
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub records: Vec<TripRecord>,
    pub report: LoadReport,
}

/// Reads every batch of a plan through a [`BatchReader`]
#[derive(Debug)]
pub struct Loader<R> {
    reader: R,
}

impl<R: BatchReader> Loader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read and concatenate all batches of `plan` without filtering.
    ///
    /// Any batch failure aborts the whole load.
    pub fn concat(&self, plan: &BatchPlan) -> Result<(Vec<TripRecord>, LoadReport)> {
        let mut records = Vec::new();
        let mut report = LoadReport::default();

        for batch in plan.batches() {
            let rows = self.reader.read_batch(batch)?;
            debug!(batch = %batch, rows = rows.len(), "batch loaded");
            report.batch_rows.push((batch.to_string(), rows.len()));
            records.extend(rows);
        }

        report.rows_read = records.len();
        report.unknown_pickups = records.iter().filter(|r| r.pickup.is_none()).count();
        if report.unknown_pickups > 0 {
            warn!(rows = report.unknown_pickups, "rows with unparseable pickup time");
        }
        Ok((records, report))
    }

    /// Read all batches of `plan` and keep the rows picked up inside `window`
    pub fn load(&self, plan: &BatchPlan, window: &DateWindow) -> Result<LoadedData> {
        let (records, mut report) = self.concat(plan)?;
        let records = filter_window(records, window);
        report.rows_kept = records.len();

        info!(
            batches = plan.len(),
            rows_read = report.rows_read,
            rows_kept = report.rows_kept,
            unknown_pickups = report.unknown_pickups,
            window = %window,
            "load finished"
        );

        Ok(LoadedData { records, report })
    }
}

/// Keep records whose pickup lies in the window; unknown pickups are dropped
pub fn filter_window(records: Vec<TripRecord>, window: &DateWindow) -> Vec<TripRecord> {
    records
        .into_iter()
        .filter(|record| record.pickup.map_or(false, |ts| window.contains(ts)))
        .collect()
}
