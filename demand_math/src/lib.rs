//! # Demand Math
//!
//! Statistical building blocks used by the demand pipeline.
//! This crate provides order statistics (median, quantiles), the mode of a
//! categorical sample, summary tables and an ordinary least-squares line.

use thiserror::Error;

pub mod regression;
pub mod statistics;

pub use regression::{fit_line, LinearFit};
pub use statistics::{describe, mean, median, mode, quantile, std_dev, Interpolation, Summary};

/// Errors that can occur in statistical calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for statistical operations
pub type Result<T> = std::result::Result<T, MathError>;
