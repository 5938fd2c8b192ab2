//! Ordinary least-squares line fitting

use crate::{MathError, Result};

/// A fitted line `y = intercept + slope * x`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination on the fitted sample
    pub r_squared: f64,
}

impl LinearFit {
    /// Evaluate the line at `x`
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fit a least-squares line through paired observations
pub fn fit_line(xs: &[f64], ys: &[f64]) -> Result<LinearFit> {
    if xs.len() != ys.len() {
        return Err(MathError::InvalidInput(format!(
            "x and y must have the same length ({} vs {})",
            xs.len(),
            ys.len()
        )));
    }
    if xs.len() < 2 {
        return Err(MathError::InsufficientData(
            "Need at least 2 points for linear regression".to_string(),
        ));
    }

    let n = xs.len() as f64;
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = ys.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (&x, &y) in xs.iter().zip(ys) {
        numerator += (x - x_mean) * (y - y_mean);
        denominator += (x - x_mean) * (x - x_mean);
    }

    if denominator.abs() < 1e-10 {
        return Err(MathError::CalculationError(
            "Cannot calculate slope: x values are too similar".to_string(),
        ));
    }

    let slope = numerator / denominator;
    let intercept = y_mean - slope * x_mean;

    let mut ss_total = 0.0;
    let mut ss_residual = 0.0;
    for (&x, &y) in xs.iter().zip(ys) {
        ss_total += (y - y_mean).powi(2);
        ss_residual += (y - (intercept + slope * x)).powi(2);
    }

    // A flat series is explained perfectly by a flat line
    let r_squared = if ss_total.abs() < 1e-12 {
        1.0
    } else {
        1.0 - ss_residual / ss_total
    };

    Ok(LinearFit {
        slope,
        intercept,
        r_squared,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_line() {
        let fit = fit_line(&[0.0, 1.0, 2.0], &[10.0, 20.0, 30.0]).unwrap();

        assert!((fit.slope - 10.0).abs() < 0.001);
        assert!((fit.intercept - 10.0).abs() < 0.001);
        assert!((fit.predict(3.0) - 40.0).abs() < 0.001);
        assert!(fit.r_squared > 0.999);
    }

    #[test]
    fn test_requires_two_points() {
        assert!(matches!(
            fit_line(&[1.0], &[1.0]),
            Err(MathError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_degenerate_x() {
        assert!(matches!(
            fit_line(&[2.0, 2.0], &[1.0, 3.0]),
            Err(MathError::CalculationError(_))
        ));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(fit_line(&[1.0, 2.0], &[1.0]).is_err());
    }
}
