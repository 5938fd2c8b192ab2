//! Additive linear trend with day-of-week effects

use crate::aggregation::DailySeries;
use crate::error::{DemandError, Result};
use crate::models::{FittedForecaster, ForecastPoint, Forecaster};
use chrono::{Datelike, NaiveDate};
use demand_math::{fit_line, LinearFit};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

/// Linear trend plus centered weekday effects, with a normal prediction band
#[derive(Debug, Clone)]
pub struct SeasonalTrend {
    /// Name of the model
    name: String,
    /// Coverage of the prediction band, e.g. 0.8
    interval_width: f64,
    /// Whether weekday effects are estimated
    weekly: bool,
}

/// Fitted seasonal trend model
#[derive(Debug, Clone)]
pub struct FittedSeasonalTrend {
    name: String,
    /// Day zero of the trend line
    origin: NaiveDate,
    line: LinearFit,
    /// Effect per weekday, Monday first
    weekday_effects: [f64; 7],
    /// Standard deviation of the remaining residuals
    sigma: f64,
    /// Normal quantile matching the interval width
    z: f64,
    history: Vec<NaiveDate>,
}

impl SeasonalTrend {
    /// Create a new model
    pub fn new(interval_width: f64, weekly: bool) -> Result<Self> {
        if interval_width <= 0.0 || interval_width >= 1.0 {
            return Err(DemandError::InvalidParameter(
                "Interval width must be between 0 and 1".to_string(),
            ));
        }

        let name = if weekly {
            format!("Seasonal Trend (weekly, interval={})", interval_width)
        } else {
            format!("Linear Trend (interval={})", interval_width)
        };

        Ok(Self {
            name,
            interval_width,
            weekly,
        })
    }

    pub fn interval_width(&self) -> f64 {
        self.interval_width
    }
}

impl Default for SeasonalTrend {
    fn default() -> Self {
        Self {
            name: "Seasonal Trend (weekly, interval=0.8)".to_string(),
            interval_width: 0.8,
            weekly: true,
        }
    }
}

impl Forecaster for SeasonalTrend {
    type Fitted = FittedSeasonalTrend;

    fn fit(&self, series: &DailySeries) -> Result<Self::Fitted> {
        let origin = match series.first_period() {
            Some(date) if series.len() >= 2 => date,
            _ => {
                return Err(DemandError::ForecastingError(format!(
                    "Need at least 2 points to fit, got {}",
                    series.len()
                )))
            }
        };

        let history = series.periods();
        let xs: Vec<f64> = history.iter().map(|d| day_offset(origin, *d)).collect();
        let ys = series.values();
        let line = fit_line(&xs, &ys)?;

        let residuals: Vec<f64> = xs
            .iter()
            .zip(&ys)
            .map(|(&x, &y)| y - line.predict(x))
            .collect();

        let weekday_effects = if self.weekly {
            weekday_means(&history, &residuals)
        } else {
            [0.0; 7]
        };

        let sse: f64 = history
            .iter()
            .zip(&residuals)
            .map(|(date, r)| (r - weekday_effects[weekday(*date)]).powi(2))
            .sum();
        let sigma = if history.len() > 2 {
            (sse / (history.len() - 2) as f64).sqrt()
        } else {
            0.0
        };

        let normal = Normal::new(0.0, 1.0).map_err(|e| DemandError::ForecastingError(e.to_string()))?;
        let z = normal.inverse_cdf(0.5 + self.interval_width / 2.0);

        debug!(
            slope = line.slope,
            intercept = line.intercept,
            sigma,
            points = history.len(),
            "seasonal trend fitted"
        );

        Ok(FittedSeasonalTrend {
            name: self.name.clone(),
            origin,
            line,
            weekday_effects,
            sigma,
            z,
            history,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl FittedSeasonalTrend {
    pub fn slope(&self) -> f64 {
        self.line.slope
    }

    pub fn weekday_effects(&self) -> &[f64; 7] {
        &self.weekday_effects
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl FittedForecaster for FittedSeasonalTrend {
    fn predict(&self, dates: &[NaiveDate]) -> Result<Vec<ForecastPoint>> {
        let margin = self.z * self.sigma;

        Ok(dates
            .iter()
            .map(|&date| {
                let trend = self.line.predict(day_offset(self.origin, date));
                let weekly = self.weekday_effects[weekday(date)];
                let yhat = trend + weekly;
                ForecastPoint {
                    date,
                    yhat,
                    yhat_lower: yhat - margin,
                    yhat_upper: yhat + margin,
                    trend,
                    weekly,
                }
            })
            .collect())
    }

    fn history_dates(&self) -> &[NaiveDate] {
        &self.history
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn day_offset(origin: NaiveDate, date: NaiveDate) -> f64 {
    (date - origin).num_days() as f64
}

fn weekday(date: NaiveDate) -> usize {
    date.weekday().num_days_from_monday() as usize
}

/// Mean residual per weekday, shifted so the observed weekdays average zero
fn weekday_means(dates: &[NaiveDate], residuals: &[f64]) -> [f64; 7] {
    let mut sums = [0.0; 7];
    let mut counts = [0usize; 7];
    for (date, r) in dates.iter().zip(residuals) {
        let day = weekday(*date);
        sums[day] += r;
        counts[day] += 1;
    }

    let mut effects = [0.0; 7];
    let mut observed = 0;
    for day in 0..7 {
        if counts[day] > 0 {
            effects[day] = sums[day] / counts[day] as f64;
            observed += 1;
        }
    }

    if observed > 0 {
        let center = effects.iter().sum::<f64>() / observed as f64;
        for day in 0..7 {
            if counts[day] > 0 {
                effects[day] -= center;
            }
        }
    }

    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{CountPoint, CountSeries};
    use chrono::Duration;

    fn series_from(start: NaiveDate, counts: &[u64]) -> DailySeries {
        CountSeries::new(
            counts
                .iter()
                .enumerate()
                .map(|(i, &c)| CountPoint::new(start + Duration::days(i as i64), c))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_interval_width() {
        assert!(SeasonalTrend::new(0.0, true).is_err());
        assert!(SeasonalTrend::new(1.0, true).is_err());
        assert!(SeasonalTrend::new(0.95, false).is_ok());
    }

    #[test]
    fn test_fit_needs_two_points() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let model = SeasonalTrend::default();
        assert!(matches!(
            model.fit(&series_from(start, &[5])),
            Err(DemandError::ForecastingError(_))
        ));
        assert!(model.fit(&DailySeries::empty()).is_err());
    }

    #[test]
    fn test_linear_series_is_recovered() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let counts: Vec<u64> = (0..28).map(|i| 100 + 2 * i).collect();
        let fitted = SeasonalTrend::default().fit(&series_from(start, &counts)).unwrap();

        assert!((fitted.slope() - 2.0).abs() < 1e-9);
        assert!(fitted.sigma() < 1e-9);
        assert!(fitted.weekday_effects().iter().all(|e| e.abs() < 1e-9));

        let next = start + Duration::days(28);
        let points = fitted.predict(&[next]).unwrap();
        assert!((points[0].yhat - 156.0).abs() < 1e-9);
    }

    #[test]
    fn test_weekday_effects_are_centered() {
        // Monday start; weekends are busier
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let week = [100, 100, 100, 100, 100, 170, 170];
        let counts: Vec<u64> = week.iter().cycle().take(28).copied().collect();
        let fitted = SeasonalTrend::default().fit(&series_from(start, &counts)).unwrap();

        let effects = fitted.weekday_effects();
        assert!(effects.iter().sum::<f64>().abs() < 1e-9);
        assert!(effects[5] > 0.0 && effects[6] > 0.0);
        assert!(effects[0] < 0.0);
    }

    #[test]
    fn test_band_contains_point_forecast() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let counts = [10, 14, 9, 13, 11, 15, 12, 10, 16, 11];
        let fitted = SeasonalTrend::new(0.8, false)
            .unwrap()
            .fit(&series_from(start, &counts))
            .unwrap();

        for point in fitted.forecast(5).unwrap() {
            assert!(point.yhat_lower < point.yhat);
            assert!(point.yhat < point.yhat_upper);
            assert_eq!(point.weekly, 0.0);
        }
    }
}
