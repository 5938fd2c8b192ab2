//! Pipeline configuration
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! JSON file named by `TAXI_CONFIG`, and `TAXI_*` environment variables. A
//! `.env` file in the working directory is loaded first.

use crate::data::{BatchFormat, BatchPlan};
use crate::error::{DemandError, Result};
use crate::evaluation::CrossValidation;
use crate::loader::DateWindow;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Environment variable naming an optional JSON config file
pub const CONFIG_FILE_VAR: &str = "TAXI_CONFIG";

/// A calendar month, written `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl FromStr for YearMonth {
    type Err = DemandError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || DemandError::Config(format!("Invalid month '{}', expected YYYY-MM", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }

        Ok(Self { year, month })
    }
}

impl TryFrom<String> for YearMonth {
    type Error = DemandError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Settings of one pipeline run
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding the batch files
    pub data_dir: PathBuf,
    /// File name prefix of the batches
    pub dataset: String,
    pub format: BatchFormat,
    /// Every month of this year is loaded
    pub year: i32,
    /// Months loaded in addition to `year`
    pub extra_months: Vec<YearMonth>,
    /// First pickup date kept
    pub window_start: NaiveDate,
    /// First pickup date dropped
    pub window_end: NaiveDate,
    /// Days held out for evaluation
    pub test_size: usize,
    /// Days forecast after the full series
    pub horizon: usize,
    /// Rows shown in table previews
    pub preview_rows: usize,
    pub interval_width: f64,
    pub weekly_seasonality: bool,
    /// Rolling-origin evaluation on the full series, off when absent
    pub cross_validation: Option<CrossValidation>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            dataset: "yellow_tripdata".to_string(),
            format: BatchFormat::Parquet,
            year: 2024,
            extra_months: vec![YearMonth {
                year: 2025,
                month: 1,
            }],
            window_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            window_end: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap_or_default(),
            test_size: 30,
            horizon: 30,
            preview_rows: 5,
            interval_width: 0.8,
            weekly_seasonality: true,
            cross_validation: None,
        }
    }
}

impl PipelineConfig {
    /// Build the configuration from defaults, the optional config file and
    /// the process environment
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }

        let config = match std::env::var(CONFIG_FILE_VAR) {
            Ok(path) => Self::from_json_file(path)?,
            Err(_) => Self::default(),
        };

        config.with_env(|key| std::env::var(key).ok())
    }

    /// Read a JSON config file; absent keys keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            DemandError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| DemandError::Config(format!("Invalid {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `TAXI_*` overrides read through `lookup`
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("TAXI_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(dataset) = lookup("TAXI_DATASET") {
            self.dataset = dataset;
        }
        if let Some(format) = lookup("TAXI_FORMAT") {
            self.format = format.parse()?;
        }
        if let Some(year) = lookup("TAXI_YEAR") {
            self.year = parse_var("TAXI_YEAR", &year)?;
        }
        if let Some(months) = lookup("TAXI_EXTRA_MONTHS") {
            self.extra_months = months
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::parse)
                .collect::<Result<_>>()?;
        }
        if let Some(start) = lookup("TAXI_WINDOW_START") {
            self.window_start = parse_var("TAXI_WINDOW_START", &start)?;
        }
        if let Some(end) = lookup("TAXI_WINDOW_END") {
            self.window_end = parse_var("TAXI_WINDOW_END", &end)?;
        }
        if let Some(size) = lookup("TAXI_TEST_SIZE") {
            self.test_size = parse_var("TAXI_TEST_SIZE", &size)?;
        }
        if let Some(horizon) = lookup("TAXI_HORIZON") {
            self.horizon = parse_var("TAXI_HORIZON", &horizon)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Check values that no later stage would catch on its own
    pub fn validate(&self) -> Result<()> {
        if self.dataset.is_empty() {
            return Err(DemandError::Config("Dataset name is empty".to_string()));
        }
        if self.window_start >= self.window_end {
            return Err(DemandError::Config(format!(
                "Window start {} must be before window end {}",
                self.window_start, self.window_end
            )));
        }
        if self.interval_width <= 0.0 || self.interval_width >= 1.0 {
            return Err(DemandError::Config(format!(
                "Interval width must be between 0 and 1, got {}",
                self.interval_width
            )));
        }
        if let Some(cv) = &self.cross_validation {
            CrossValidation::new(cv.initial, cv.period, cv.horizon)
                .map_err(|e| DemandError::Config(e.to_string()))?;
        }
        Ok(())
    }

    /// All months of `year` plus the extra months
    pub fn batch_plan(&self) -> Result<BatchPlan> {
        let to_config = |e: DemandError| DemandError::Config(e.to_string());
        let mut plan = BatchPlan::year(&self.dataset, self.year).map_err(to_config)?;
        for extra in &self.extra_months {
            plan = plan
                .with_month(&self.dataset, extra.year, extra.month)
                .map_err(to_config)?;
        }
        Ok(plan)
    }

    pub fn window(&self) -> Result<DateWindow> {
        DateWindow::from_dates(self.window_start, self.window_end)
            .map_err(|e| DemandError::Config(e.to_string()))
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| DemandError::Config(format!("{}='{}': {}", name, value, e)))
}
