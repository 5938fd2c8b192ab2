//! Aggregation of trip records into count series
//!
//! Records are grouped on a truncated pickup time (calendar date or top of the
//! hour) and counted. Periods without trips produce no point: the series has
//! gaps rather than zeros.

use crate::error::{DemandError, Result};
use crate::records::TripRecord;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::collections::BTreeMap;
use std::fmt;

/// Number of trips in one period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountPoint<T> {
    pub period: T,
    pub count: u64,
}

impl<T> CountPoint<T> {
    pub fn new(period: T, count: u64) -> Self {
        Self { period, count }
    }
}

/// Count series with strictly increasing periods
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountSeries<T> {
    points: Vec<CountPoint<T>>,
}

/// One point per calendar date with at least one trip
pub type DailySeries = CountSeries<NaiveDate>;
pub type DailyPoint = CountPoint<NaiveDate>;

/// One point per hour with at least one trip
pub type HourlySeries = CountSeries<NaiveDateTime>;
pub type HourlyPoint = CountPoint<NaiveDateTime>;

impl<T: Ord + Copy> CountSeries<T> {
    /// Build a series, rejecting unsorted or repeated periods
    pub fn new(points: Vec<CountPoint<T>>) -> Result<Self> {
        if points.windows(2).any(|pair| pair[0].period >= pair[1].period) {
            return Err(DemandError::InvalidParameter(
                "Series periods must be strictly increasing".to_string(),
            ));
        }

        Ok(Self { points })
    }

    pub fn empty() -> Self {
        Self { points: Vec::new() }
    }

    pub fn points(&self) -> &[CountPoint<T>] {
        &self.points
    }

    pub fn into_points(self) -> Vec<CountPoint<T>> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_period(&self) -> Option<T> {
        self.points.first().map(|p| p.period)
    }

    pub fn last_period(&self) -> Option<T> {
        self.points.last().map(|p| p.period)
    }

    pub fn periods(&self) -> Vec<T> {
        self.points.iter().map(|p| p.period).collect()
    }

    /// Counts as floats, in period order
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.count as f64).collect()
    }

    pub fn total(&self) -> u64 {
        self.points.iter().map(|p| p.count).sum()
    }

    /// Contiguous sub-series `[start, end)` by position
    pub fn slice(&self, start: usize, end: usize) -> Self {
        Self {
            points: self.points[start..end].to_vec(),
        }
    }

    /// The first `n` points
    pub fn head(&self, n: usize) -> &[CountPoint<T>] {
        &self.points[..n.min(self.points.len())]
    }

    /// The last `n` points
    pub fn tail(&self, n: usize) -> &[CountPoint<T>] {
        &self.points[self.points.len().saturating_sub(n)..]
    }
}

impl<T: fmt::Display> fmt::Display for CountPoint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}", self.period, self.count)
    }
}

/// Group records by `key` and count them; records yielding `None` are skipped
pub fn aggregate_by<T, F>(records: &[TripRecord], key: F) -> CountSeries<T>
where
    T: Ord + Copy,
    F: Fn(&TripRecord) -> Option<T>,
{
    let mut counts: BTreeMap<T, u64> = BTreeMap::new();
    for period in records.iter().filter_map(key) {
        *counts.entry(period).or_insert(0) += 1;
    }

    CountSeries {
        points: counts
            .into_iter()
            .map(|(period, count)| CountPoint { period, count })
            .collect(),
    }
}

/// Trips per calendar date of pickup
pub fn aggregate_daily(records: &[TripRecord]) -> DailySeries {
    aggregate_by(records, TripRecord::pickup_date)
}

/// Trips per hour of pickup
pub fn aggregate_hourly(records: &[TripRecord]) -> HourlySeries {
    aggregate_by(records, |record| record.pickup.map(truncate_to_hour))
}

fn truncate_to_hour(timestamp: NaiveDateTime) -> NaiveDateTime {
    NaiveDateTime::new(timestamp.date(), NaiveTime::default()) + Duration::hours(timestamp.hour() as i64)
}
