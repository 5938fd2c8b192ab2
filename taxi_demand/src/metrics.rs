//! Forecast accuracy metrics

use crate::error::{DemandError, Result};
use std::fmt;

/// Forecast accuracy metrics
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastMetrics {
    /// Number of compared pairs
    pub count: usize,
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error over the pairs with a non-zero actual,
    /// `None` when every actual is zero
    pub mape: Option<f64>,
}

/// Compare actual values with forecasts, pairwise
pub fn forecast_accuracy(actual: &[f64], forecast: &[f64]) -> Result<ForecastMetrics> {
    if forecast.len() != actual.len() || forecast.is_empty() {
        return Err(DemandError::InvalidParameter(
            "Forecast and actual values must have the same non-zero length".to_string(),
        ));
    }

    let n = actual.len() as f64;

    let errors: Vec<f64> = actual
        .iter()
        .zip(forecast.iter())
        .map(|(&a, &f)| a - f)
        .collect();

    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let mse = errors.iter().map(|e| e.powi(2)).sum::<f64>() / n;
    let rmse = mse.sqrt();

    let percentages: Vec<f64> = actual
        .iter()
        .zip(errors.iter())
        .filter(|(&a, _)| a != 0.0)
        .map(|(&a, &e)| (e.abs() / a.abs()) * 100.0)
        .collect();
    let mape = if percentages.is_empty() {
        None
    } else {
        Some(percentages.iter().sum::<f64>() / percentages.len() as f64)
    };

    Ok(ForecastMetrics {
        count: actual.len(),
        mae,
        mse,
        rmse,
        mape,
    })
}

impl fmt::Display for ForecastMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics ({} points):", self.count)?;
        writeln!(f, "  MAE:   {:.2}", self.mae)?;
        writeln!(f, "  MSE:   {:.2}", self.mse)?;
        writeln!(f, "  RMSE:  {:.2}", self.rmse)?;
        match self.mape {
            Some(mape) => writeln!(f, "  MAPE:  {:.2}%", mape)?,
            None => writeln!(f, "  MAPE:  n/a (all actuals are zero)")?,
        }
        Ok(())
    }
}
