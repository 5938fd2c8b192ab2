//! Descriptive statistics over samples of observations
//!
//! Contains:
//! - Mean and sample standard deviation
//! - Median and quantiles (nearest-rank or linear interpolation)
//! - Mode of a categorical sample
//! - A `describe`-style summary table

use crate::{MathError, Result};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// How a quantile is picked when it falls between two order statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Use the order statistic closest to the fractional rank.
    ///
    /// The result is always an observed value, so clamping a sample to its own
    /// nearest-rank quantiles and recomputing them yields the same bounds.
    #[default]
    Nearest,
    /// Interpolate linearly between the two surrounding order statistics
    Linear,
}

/// Arithmetic mean of a sample
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute the mean of an empty sample".to_string(),
        ));
    }

    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 in the denominator)
pub fn std_dev(values: &[f64]) -> Result<f64> {
    if values.len() < 2 {
        return Err(MathError::InsufficientData(
            "Standard deviation needs at least 2 observations".to_string(),
        ));
    }

    let avg = mean(values)?;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;

    Ok(variance.sqrt())
}

/// Median of a sample; the two middle values are averaged for even sizes
pub fn median(values: &[f64]) -> Result<f64> {
    let sorted = sorted_copy(values)?;
    let n = sorted.len();

    if n % 2 == 1 {
        Ok(sorted[n / 2])
    } else {
        Ok((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}

/// Quantile `q` (between 0 and 1) of a sample
pub fn quantile(values: &[f64], q: f64, interpolation: Interpolation) -> Result<f64> {
    if !(0.0..=1.0).contains(&q) {
        return Err(MathError::InvalidInput(format!(
            "Quantile must be between 0 and 1, got {}",
            q
        )));
    }

    let sorted = sorted_copy(values)?;
    Ok(quantile_sorted(&sorted, q, interpolation))
}

/// Quantile of an already sorted, non-empty sample
fn quantile_sorted(sorted: &[f64], q: f64, interpolation: Interpolation) -> f64 {
    let rank = q * (sorted.len() - 1) as f64;

    match interpolation {
        Interpolation::Nearest => sorted[rank.round() as usize],
        Interpolation::Linear => {
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let fraction = rank - lower as f64;
            sorted[lower] + fraction * (sorted[upper] - sorted[lower])
        }
    }
}

/// Most frequent value of a sample.
///
/// Ties go to the value that appears first in the sample.
pub fn mode<T>(values: &[T]) -> Result<T>
where
    T: Eq + Hash + Clone,
{
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute the mode of an empty sample".to_string(),
        ));
    }

    // value -> (count, first position)
    let mut counts: HashMap<&T, (usize, usize)> = HashMap::new();
    for (position, value) in values.iter().enumerate() {
        counts.entry(value).or_insert((0, position)).0 += 1;
    }

    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(value, _)| value.clone())
        .ok_or_else(|| MathError::CalculationError("Mode could not be determined".to_string()))
}

/// Summary statistics of a numeric sample
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Undefined for a single observation
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Build a summary table of a sample; quartiles use linear interpolation
pub fn describe(values: &[f64]) -> Result<Summary> {
    let sorted = sorted_copy(values)?;

    Ok(Summary {
        count: sorted.len(),
        mean: mean(&sorted)?,
        std: std_dev(&sorted).ok(),
        min: sorted[0],
        q25: quantile_sorted(&sorted, 0.25, Interpolation::Linear),
        median: quantile_sorted(&sorted, 0.5, Interpolation::Linear),
        q75: quantile_sorted(&sorted, 0.75, Interpolation::Linear),
        max: sorted[sorted.len() - 1],
    })
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let std = self
            .std
            .map(|s| format!("{:.4}", s))
            .unwrap_or_else(|| "NaN".to_string());
        write!(
            f,
            "count={} mean={:.4} std={} min={:.4} 25%={:.4} 50%={:.4} 75%={:.4} max={:.4}",
            self.count, self.mean, std, self.min, self.q25, self.median, self.q75, self.max
        )
    }
}

fn sorted_copy(values: &[f64]) -> Result<Vec<f64>> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Sample is empty".to_string(),
        ));
    }
    if values.iter().any(|v| v.is_nan()) {
        return Err(MathError::InvalidInput(
            "Sample contains NaN".to_string(),
        ));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Ok(sorted)
}
