//! Record cleaning: negative scrubbing, imputation and outlier capping
//!
//! The steps run in a fixed order and each one sees the output of the one
//! before it:
//!
//! 1. negative distances and amounts become missing
//! 2. missing numeric values take the field median
//! 3. missing categorical values take the field mode
//! 4. numeric values are clamped to the field's 1st/99th percentiles
//!
//! Every step takes ownership of a record set and returns a new one, so a
//! caller's data is never modified behind its back.

use crate::error::{DemandError, Result};
use crate::records::{CategoricalField, NumericField, TripRecord};
use demand_math::{median, mode, quantile, Interpolation};
use std::fmt;
use tracing::{debug, info};

/// Fields where a negative value is invalid
pub const SCRUBBED_FIELDS: [NumericField; 3] = [
    NumericField::TripDistance,
    NumericField::FareAmount,
    NumericField::TotalAmount,
];

/// Numeric fields filled with their median
pub const MEDIAN_FIELDS: [NumericField; 7] = [
    NumericField::PassengerCount,
    NumericField::CongestionSurcharge,
    NumericField::AirportFee,
    NumericField::RateCode,
    NumericField::TripDistance,
    NumericField::FareAmount,
    NumericField::TotalAmount,
];

/// Categorical fields filled with their mode
pub const MODE_FIELDS: [CategoricalField; 1] = [CategoricalField::StoreAndFwdFlag];

/// Fields clamped to their percentile bounds
pub const CAPPED_FIELDS: [NumericField; 3] = [
    NumericField::TripDistance,
    NumericField::FareAmount,
    NumericField::TotalAmount,
];

/// Percentile bounds for outlier capping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapBounds {
    pub lower_percentile: f64,
    pub upper_percentile: f64,
}

impl Default for CapBounds {
    fn default() -> Self {
        Self {
            lower_percentile: 0.01,
            upper_percentile: 0.99,
        }
    }
}

/// A field filled with a single value
#[derive(Debug, Clone, PartialEq)]
pub struct Fill<F, V> {
    pub field: F,
    pub value: V,
    /// Number of records that received the value
    pub filled: usize,
}

/// Outcome of capping one field
#[derive(Debug, Clone, PartialEq)]
pub struct Capping {
    pub field: NumericField,
    pub lower: f64,
    pub upper: f64,
    /// Values raised to `lower`
    pub raised: usize,
    /// Values lowered to `upper`
    pub lowered: usize,
}

/// What each cleaning step changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleaningReport {
    pub scrubbed: Vec<(NumericField, usize)>,
    pub numeric_fills: Vec<Fill<NumericField, f64>>,
    pub categorical_fills: Vec<Fill<CategoricalField, String>>,
    pub cappings: Vec<Capping>,
}

impl CleaningReport {
    /// True when no step touched any value
    pub fn is_noop(&self) -> bool {
        self.scrubbed.iter().all(|(_, n)| *n == 0)
            && self.numeric_fills.iter().all(|fill| fill.filled == 0)
            && self.categorical_fills.iter().all(|fill| fill.filled == 0)
            && self.cappings.iter().all(|cap| cap.raised == 0 && cap.lowered == 0)
    }
}

impl fmt::Display for CleaningReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Negative values set to missing:")?;
        for (field, count) in &self.scrubbed {
            writeln!(f, "  {:<22} {}", field.column(), count)?;
        }
        writeln!(f, "Numeric fills (median):")?;
        for fill in &self.numeric_fills {
            writeln!(f, "  {:<22} {} x {:.4}", fill.field.column(), fill.filled, fill.value)?;
        }
        writeln!(f, "Categorical fills (mode):")?;
        for fill in &self.categorical_fills {
            writeln!(f, "  {:<22} {} x {:?}", fill.field.column(), fill.filled, fill.value)?;
        }
        writeln!(f, "Outlier capping:")?;
        for cap in &self.cappings {
            writeln!(
                f,
                "  {:<22} [{:.4}, {:.4}] raised {} lowered {}",
                cap.field.column(),
                cap.lower,
                cap.upper,
                cap.raised,
                cap.lowered
            )?;
        }
        Ok(())
    }
}

/// Cleaned records with the report of what changed
#[derive(Debug, Clone)]
pub struct Cleaned {
    pub records: Vec<TripRecord>,
    pub report: CleaningReport,
}

/// Runs the four cleaning steps in order
#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    bounds: CapBounds,
}

impl Cleaner {
    pub fn new(bounds: CapBounds) -> Result<Self> {
        let CapBounds {
            lower_percentile,
            upper_percentile,
        } = bounds;
        if !(0.0..=1.0).contains(&lower_percentile)
            || !(0.0..=1.0).contains(&upper_percentile)
            || lower_percentile > upper_percentile
        {
            return Err(DemandError::InvalidParameter(format!(
                "Capping percentiles must satisfy 0 <= lower <= upper <= 1, got {} and {}",
                lower_percentile, upper_percentile
            )));
        }

        Ok(Self { bounds })
    }

    /// Clean a record set; the input is left untouched.
    ///
    /// An empty record set comes back empty.
    pub fn clean(&self, records: &[TripRecord]) -> Result<Cleaned> {
        if records.is_empty() {
            return Ok(Cleaned {
                records: Vec::new(),
                report: CleaningReport::default(),
            });
        }

        let (records, scrubbed) = scrub_negatives(records.to_vec(), &SCRUBBED_FIELDS);
        let (records, numeric_fills) = impute_median(records, &MEDIAN_FIELDS)?;
        let (records, categorical_fills) = impute_mode(records, &MODE_FIELDS)?;
        let (records, cappings) = cap_outliers(records, &CAPPED_FIELDS, self.bounds)?;

        let report = CleaningReport {
            scrubbed,
            numeric_fills,
            categorical_fills,
            cappings,
        };
        info!(rows = records.len(), noop = report.is_noop(), "cleaning finished");

        Ok(Cleaned { records, report })
    }
}

/// Replace negative values of `fields` with missing
pub fn scrub_negatives(
    mut records: Vec<TripRecord>,
    fields: &[NumericField],
) -> (Vec<TripRecord>, Vec<(NumericField, usize)>) {
    let mut counts = Vec::with_capacity(fields.len());

    for &field in fields {
        let mut scrubbed = 0;
        for record in records.iter_mut() {
            if record.numeric(field).map_or(false, |v| v < 0.0) {
                record.set_numeric(field, None);
                scrubbed += 1;
            }
        }
        debug!(field = %field, scrubbed, "negative values scrubbed");
        counts.push((field, scrubbed));
    }

    (records, counts)
}

/// Fill missing values of `fields` with the median of the present values
pub fn impute_median(
    mut records: Vec<TripRecord>,
    fields: &[NumericField],
) -> Result<(Vec<TripRecord>, Vec<Fill<NumericField, f64>>)> {
    let mut fills = Vec::with_capacity(fields.len());
    if records.is_empty() {
        return Ok((records, fills));
    }

    for &field in fields {
        let present: Vec<f64> = records.iter().filter_map(|r| r.numeric(field)).collect();
        if present.is_empty() {
            return Err(DemandError::EmptyColumn(field.column().to_string()));
        }

        let value = median(&present)?;
        let mut filled = 0;
        for record in records.iter_mut() {
            if record.numeric(field).is_none() {
                record.set_numeric(field, Some(value));
                filled += 1;
            }
        }
        debug!(field = %field, value, filled, "median imputation");
        fills.push(Fill {
            field,
            value,
            filled,
        });
    }

    Ok((records, fills))
}

/// Fill missing values of `fields` with the most frequent present value.
///
/// Ties go to the value encountered first in record order.
pub fn impute_mode(
    mut records: Vec<TripRecord>,
    fields: &[CategoricalField],
) -> Result<(Vec<TripRecord>, Vec<Fill<CategoricalField, String>>)> {
    let mut fills = Vec::with_capacity(fields.len());
    if records.is_empty() {
        return Ok((records, fills));
    }

    for &field in fields {
        let present: Vec<&str> = records.iter().filter_map(|r| r.categorical(field)).collect();
        if present.is_empty() {
            return Err(DemandError::EmptyColumn(field.column().to_string()));
        }

        let value = mode(&present)?.to_string();
        let mut filled = 0;
        for record in records.iter_mut() {
            if record.categorical(field).is_none() {
                record.set_categorical(field, Some(value.clone()));
                filled += 1;
            }
        }
        debug!(field = %field, value = %value, filled, "mode imputation");
        fills.push(Fill {
            field,
            value,
            filled,
        });
    }

    Ok((records, fills))
}

/// Clamp `fields` to their percentile bounds.
///
/// Bounds are nearest-rank percentiles of the present values, so they are
/// observed values and capping already-capped data changes nothing. On small
/// samples they can differ slightly from linearly interpolated percentiles.
/// Fields without any present value are skipped.
pub fn cap_outliers(
    mut records: Vec<TripRecord>,
    fields: &[NumericField],
    bounds: CapBounds,
) -> Result<(Vec<TripRecord>, Vec<Capping>)> {
    let mut cappings = Vec::with_capacity(fields.len());

    for &field in fields {
        let present: Vec<f64> = records.iter().filter_map(|r| r.numeric(field)).collect();
        if present.is_empty() {
            continue;
        }

        let lower = quantile(&present, bounds.lower_percentile, Interpolation::Nearest)?;
        let upper = quantile(&present, bounds.upper_percentile, Interpolation::Nearest)?;
        let mut raised = 0;
        let mut lowered = 0;
        for record in records.iter_mut() {
            match record.numeric(field) {
                Some(v) if v < lower => {
                    record.set_numeric(field, Some(lower));
                    raised += 1;
                }
                Some(v) if v > upper => {
                    record.set_numeric(field, Some(upper));
                    lowered += 1;
                }
                _ => {}
            }
        }
        debug!(field = %field, lower, upper, raised, lowered, "outliers capped");
        cappings.push(Capping {
            field,
            lower,
            upper,
            raised,
            lowered,
        });
    }

    Ok((records, cappings))
}
