//! Error types for the taxi_demand crate

use demand_math::MathError;
use polars::prelude::PolarsError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage an error is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Load,
    Explore,
    Clean,
    Split,
    Forecast,
    Evaluate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Config => "config",
            Stage::Load => "load",
            Stage::Explore => "explore",
            Stage::Clean => "clean",
            Stage::Split => "split",
            Stage::Forecast => "forecast",
            Stage::Evaluate => "evaluate",
        };
        f.write_str(name)
    }
}

/// Custom error types for the taxi_demand crate
#[derive(Debug, Error)]
pub enum DemandError {
    /// An expected source batch is not present
    #[error("Missing source batch: {}", path.display())]
    MissingSource { path: PathBuf },

    /// A batch could not be read into the trip record schema
    #[error("Malformed batch {source_id}: {reason}")]
    MalformedRecord { source_id: String, reason: String },

    /// A field has no observed values to impute from
    #[error("Column '{0}' has only missing values")]
    EmptyColumn(String),

    /// The test window does not fit the series
    #[error("Invalid split size: test_size={test_size} for a series of {len} points")]
    InvalidSplitSize { test_size: usize, len: usize },

    /// Test and forecast share no dates
    #[error("No overlapping dates between actuals and forecast")]
    NoOverlap,

    /// Error related to forecasting operations
    #[error("Forecasting error: {0}")]
    ForecastingError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid configuration value
    #[error("Config error: {0}")]
    Config(String),

    /// Error from statistical helpers
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

impl DemandError {
    pub(crate) fn malformed(source_id: impl Into<String>, reason: impl fmt::Display) -> Self {
        DemandError::MalformedRecord {
            source_id: source_id.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, DemandError>;

/// A [`DemandError`] tagged with the pipeline stage that raised it
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: DemandError,
}

/// Tag the error of a stage result
pub trait AtStage<T> {
    fn at_stage(self, stage: Stage) -> std::result::Result<T, StageError>;
}

impl<T> AtStage<T> for Result<T> {
    fn at_stage(self, stage: Stage) -> std::result::Result<T, StageError> {
        self.map_err(|source| StageError { stage, source })
    }
}

impl From<PolarsError> for DemandError {
    fn from(err: PolarsError) -> Self {
        DemandError::PolarsError(err.to_string())
    }
}
