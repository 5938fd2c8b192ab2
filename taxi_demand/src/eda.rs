//! Descriptive overview of a trip record set

use crate::error::Result;
use crate::records::{CategoricalField, NumericField, TripRecord, PICKUP_COLUMN};
use chrono::NaiveDateTime;
use demand_math::{describe, Summary};
use polars::prelude::*;
use std::fmt;

/// Missing count and statistics of one numeric field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSummary {
    pub field: NumericField,
    pub missing: usize,
    /// `None` when the field has no values
    pub stats: Option<Summary>,
}

/// Missing count and most frequent values of one categorical field
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub field: CategoricalField,
    pub missing: usize,
    /// Values by descending frequency
    pub counts: Vec<(String, usize)>,
}

/// Overview of a record set, printed before cleaning
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub rows: usize,
    pub missing_pickups: usize,
    /// Earliest and latest known pickup
    pub pickup_range: Option<(NaiveDateTime, NaiveDateTime)>,
    pub numeric: Vec<FieldSummary>,
    pub categorical: Vec<CategorySummary>,
}

/// Summarize every field of a record set
pub fn summarize(records: &[TripRecord]) -> DatasetSummary {
    let pickups = records.iter().filter_map(|r| r.pickup);
    let pickup_range = pickups.clone().min().zip(pickups.max());

    let numeric = NumericField::ALL
        .into_iter()
        .map(|field| {
            let values: Vec<f64> = records.iter().filter_map(|r| r.numeric(field)).collect();
            FieldSummary {
                field,
                missing: records.len() - values.len(),
                stats: describe(&values).ok(),
            }
        })
        .collect();

    let categorical = CategoricalField::ALL
        .into_iter()
        .map(|field| {
            let mut counts: Vec<(String, usize)> = Vec::new();
            let mut missing = 0;
            for record in records {
                match record.categorical(field) {
                    Some(value) => match counts.iter_mut().find(|(v, _)| v == value) {
                        Some((_, count)) => *count += 1,
                        None => counts.push((value.to_string(), 1)),
                    },
                    None => missing += 1,
                }
            }
            // stable sort keeps first-seen order among equal counts
            counts.sort_by(|a, b| b.1.cmp(&a.1));
            CategorySummary {
                field,
                missing,
                counts,
            }
        })
        .collect();

    DatasetSummary {
        rows: records.len(),
        missing_pickups: records.iter().filter(|r| r.pickup.is_none()).count(),
        pickup_range,
        numeric,
        categorical,
    }
}

/// The first `n` records as a polars table, for console previews
pub fn records_frame(records: &[TripRecord], n: usize) -> Result<DataFrame> {
    let head = &records[..n.min(records.len())];

    let pickups: Vec<Option<i64>> = head
        .iter()
        .map(|r| r.pickup.map(|ts| ts.and_utc().timestamp_micros()))
        .collect();
    let mut columns = vec![Series::new(PICKUP_COLUMN, pickups)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?];

    for field in NumericField::ALL {
        let values: Vec<Option<f64>> = head.iter().map(|r| r.numeric(field)).collect();
        columns.push(Series::new(field.column(), values));
    }
    for field in CategoricalField::ALL {
        let values: Vec<Option<&str>> = head.iter().map(|r| r.categorical(field)).collect();
        columns.push(Series::new(field.column(), values));
    }

    Ok(DataFrame::new(columns)?)
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rows: {}", self.rows)?;
        match self.pickup_range {
            Some((first, last)) => writeln!(f, "Pickups: {} .. {}", first, last)?,
            None => writeln!(f, "Pickups: none")?,
        }
        writeln!(f, "Missing values:")?;
        writeln!(f, "  {:<22} {}", PICKUP_COLUMN, self.missing_pickups)?;
        for summary in &self.numeric {
            writeln!(f, "  {:<22} {}", summary.field.column(), summary.missing)?;
        }
        for summary in &self.categorical {
            writeln!(f, "  {:<22} {}", summary.field.column(), summary.missing)?;
        }

        writeln!(f, "Statistics:")?;
        for summary in &self.numeric {
            match &summary.stats {
                Some(stats) => writeln!(f, "  {:<22} {}", summary.field.column(), stats)?,
                None => writeln!(f, "  {:<22} no values", summary.field.column())?,
            }
        }

        for summary in &self.categorical {
            let counts: Vec<String> = summary
                .counts
                .iter()
                .map(|(value, count)| format!("{}={}", value, count))
                .collect();
            writeln!(f, "  {:<22} {}", summary.field.column(), counts.join(" "))?;
        }
        Ok(())
    }
}
