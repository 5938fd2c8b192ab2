//! # Taxi Demand
//!
//! A Rust library for forecasting daily taxi trip demand from monthly trip
//! record batches.
//!
//! ## Features
//!
//! - Monthly batch loading (Parquet or CSV) with a closed-open date window
//! - Record cleaning: negative scrubbing, median/mode imputation, percentile capping
//! - Daily and hourly trip count aggregation
//! - Positional train/test split of the daily series
//! - Forecasting behind the `Forecaster` trait, with a seasonal trend model
//! - Forecast evaluation (MAE, MSE, RMSE, MAPE) and rolling-origin cross-validation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use taxi_demand::aggregation::aggregate_daily;
//! use taxi_demand::cleaning::Cleaner;
//! use taxi_demand::data::{BatchFormat, BatchPlan, DirectoryReader};
//! use taxi_demand::evaluation::evaluate;
//! use taxi_demand::loader::{DateWindow, Loader};
//! use taxi_demand::models::{FittedForecaster, Forecaster, SeasonalTrend};
//! use taxi_demand::split::train_test_split;
//! use chrono::NaiveDate;
//!
//! # fn main() -> taxi_demand::Result<()> {
//! // Load every month of 2024
//! let reader = DirectoryReader::new("data", BatchFormat::Parquet);
//! let plan = BatchPlan::year("yellow_tripdata", 2024)?;
//! let window = DateWindow::from_dates(
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
//! )?;
//! let loaded = Loader::new(reader).load(&plan, &window)?;
//!
//! // Clean, aggregate and split
//! let cleaned = Cleaner::default().clean(&loaded.records)?;
//! let daily = aggregate_daily(&cleaned.records);
//! let split = train_test_split(&daily, 30)?;
//!
//! // Fit on the training days and score the held-out ones
//! let fitted = SeasonalTrend::default().fit(&split.train)?;
//! let forecast = fitted.predict(&split.test.periods())?;
//! let evaluation = evaluate(&split.test, &forecast)?;
//! println!("{}", evaluation.metrics);
//! # Ok(())
//! # }
//! ```

pub mod aggregation;
pub mod cleaning;
pub mod config;
pub mod data;
pub mod eda;
pub mod error;
pub mod evaluation;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod records;
pub mod split;

// Re-export commonly used types
pub use crate::aggregation::{DailySeries, HourlySeries};
pub use crate::config::PipelineConfig;
pub use crate::error::{DemandError, Result, Stage, StageError};
pub use crate::models::{FittedForecaster, ForecastPoint, Forecaster};
pub use crate::records::TripRecord;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
