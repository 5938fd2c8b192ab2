//! Forecasting models for daily demand series
//!
//! A [`Forecaster`] is fitted on a [`DailySeries`] and produces a
//! [`FittedForecaster`], which predicts a point value and an uncertainty band
//! for any set of dates.

use crate::aggregation::DailySeries;
use crate::error::Result;
use chrono::{Datelike, Duration, NaiveDate};
use polars::prelude::*;
use std::fmt::Debug;

pub mod seasonal_trend;

pub use seasonal_trend::{FittedSeasonalTrend, SeasonalTrend};

/// Days between 0001-01-01 and 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Forecast for a single date
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    /// Point forecast
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
    /// Trend component of `yhat`
    pub trend: f64,
    /// Day-of-week component of `yhat`
    pub weekly: f64,
}

/// Fitted model that can predict arbitrary dates
pub trait FittedForecaster: Debug {
    /// Predict every date in `dates`, in the given order
    fn predict(&self, dates: &[NaiveDate]) -> Result<Vec<ForecastPoint>>;

    /// Dates of the series the model was fitted on
    fn history_dates(&self) -> &[NaiveDate];

    /// Name of the model
    fn name(&self) -> &str;

    /// The history dates followed by `periods` consecutive days after the
    /// last history date
    fn future_dates(&self, periods: usize) -> Vec<NaiveDate> {
        let history = self.history_dates();
        let mut dates = history.to_vec();
        if let Some(&last) = history.last() {
            dates.extend((1..=periods as i64).map(|offset| last + Duration::days(offset)));
        }
        dates
    }

    /// Predict the history and `periods` future days
    fn forecast(&self, periods: usize) -> Result<Vec<ForecastPoint>> {
        self.predict(&self.future_dates(periods))
    }
}

/// Forecast model that can be fitted on a daily series
pub trait Forecaster: Debug + Clone {
    /// The type of fitted model produced
    type Fitted: FittedForecaster;

    /// Fit the model on a daily series
    fn fit(&self, series: &DailySeries) -> Result<Self::Fitted>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

fn epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

fn date_series(name: &str, dates: impl Iterator<Item = NaiveDate>) -> Result<Series> {
    let days: Vec<i32> = dates.map(epoch_days).collect();
    Ok(Series::new(name, days).cast(&DataType::Date)?)
}

/// Two-column `ds`/`y` table of a daily series
pub fn series_frame(series: &DailySeries) -> Result<DataFrame> {
    let ds = date_series("ds", series.points().iter().map(|p| p.period))?;
    let y = Series::new("y", series.values());
    Ok(DataFrame::new(vec![ds, y])?)
}

/// Table of forecast points with bounds and components
pub fn forecast_frame(points: &[ForecastPoint]) -> Result<DataFrame> {
    let column = |name: &str, value: fn(&ForecastPoint) -> f64| {
        Series::new(name, points.iter().map(value).collect::<Vec<f64>>())
    };

    Ok(DataFrame::new(vec![
        date_series("ds", points.iter().map(|p| p.date))?,
        column("yhat", |p| p.yhat),
        column("yhat_lower", |p| p.yhat_lower),
        column("yhat_upper", |p| p.yhat_upper),
        column("trend", |p| p.trend),
        column("weekly", |p| p.weekly),
    ])?)
}
