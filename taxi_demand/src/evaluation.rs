//! Evaluation of forecasts against held-out actuals

use crate::aggregation::DailySeries;
use crate::error::{DemandError, Result};
use crate::metrics::{forecast_accuracy, ForecastMetrics};
use crate::models::{FittedForecaster, ForecastPoint, Forecaster};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Actual and forecast value on a shared date
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedPoint {
    pub date: NaiveDate,
    pub actual: f64,
    pub forecast: f64,
}

/// Result of comparing a forecast with actuals
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Joined points, in actual date order
    pub aligned: Vec<AlignedPoint>,
    pub metrics: ForecastMetrics,
}

/// Inner join of actuals and forecast points on date.
///
/// Dates present on only one side are dropped.
pub fn align(actual: &DailySeries, forecast: &[ForecastPoint]) -> Vec<AlignedPoint> {
    let by_date: HashMap<NaiveDate, f64> = forecast.iter().map(|p| (p.date, p.yhat)).collect();

    actual
        .points()
        .iter()
        .filter_map(|point| {
            by_date.get(&point.period).map(|&yhat| AlignedPoint {
                date: point.period,
                actual: point.count as f64,
                forecast: yhat,
            })
        })
        .collect()
}

/// Join actuals and forecast on date and compute accuracy metrics
pub fn evaluate(actual: &DailySeries, forecast: &[ForecastPoint]) -> Result<Evaluation> {
    let aligned = align(actual, forecast);
    if aligned.is_empty() {
        return Err(DemandError::NoOverlap);
    }

    let actuals: Vec<f64> = aligned.iter().map(|p| p.actual).collect();
    let forecasts: Vec<f64> = aligned.iter().map(|p| p.forecast).collect();
    let metrics = forecast_accuracy(&actuals, &forecasts)?;

    debug!(
        joined = aligned.len(),
        actuals = actual.len(),
        forecasts = forecast.len(),
        "forecast evaluated"
    );

    Ok(Evaluation { aligned, metrics })
}

/// Rolling-origin windows, all counted in points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CrossValidation {
    /// Points in the first training prefix
    pub initial: usize,
    /// Points the cutoff advances between folds
    pub period: usize,
    /// Points evaluated after each cutoff
    pub horizon: usize,
}

/// Metrics of one cross-validation fold
#[derive(Debug, Clone, PartialEq)]
pub struct Fold {
    /// Last training date
    pub cutoff: NaiveDate,
    pub train_len: usize,
    pub metrics: ForecastMetrics,
}

impl CrossValidation {
    pub fn new(initial: usize, period: usize, horizon: usize) -> Result<Self> {
        if initial < 2 {
            return Err(DemandError::InvalidParameter(
                "Cross-validation needs an initial window of at least 2 points".to_string(),
            ));
        }
        if period == 0 || horizon == 0 {
            return Err(DemandError::InvalidParameter(
                "Cross-validation period and horizon must be positive".to_string(),
            ));
        }

        Ok(Self {
            initial,
            period,
            horizon,
        })
    }

    /// Fit on a growing prefix and evaluate on the next `horizon` points,
    /// advancing the cutoff by `period` until the series runs out
    pub fn run<F: Forecaster>(&self, forecaster: &F, series: &DailySeries) -> Result<Vec<Fold>> {
        if self.initial + self.horizon > series.len() {
            return Err(DemandError::InvalidParameter(format!(
                "Series of {} points is too short for initial={} and horizon={}",
                series.len(),
                self.initial,
                self.horizon
            )));
        }

        let mut folds = Vec::new();
        let mut end = self.initial;
        while end + self.horizon <= series.len() {
            let train = series.slice(0, end);
            let test = series.slice(end, end + self.horizon);

            let fitted = forecaster.fit(&train)?;
            let forecast = fitted.predict(&test.periods())?;
            let evaluation = evaluate(&test, &forecast)?;

            if let Some(cutoff) = train.last_period() {
                folds.push(Fold {
                    cutoff,
                    train_len: train.len(),
                    metrics: evaluation.metrics,
                });
            }
            end += self.period;
        }

        Ok(folds)
    }
}

impl fmt::Display for Fold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mape = self
            .metrics
            .mape
            .map(|m| format!("{:.2}%", m))
            .unwrap_or_else(|| "n/a".to_string());
        write!(
            f,
            "cutoff {} (train {}): MAE {:.2}, RMSE {:.2}, MAPE {}",
            self.cutoff, self.train_len, self.metrics.mae, self.metrics.rmse, mape
        )
    }
}
