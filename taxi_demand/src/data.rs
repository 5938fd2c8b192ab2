//! Source batches: naming, discovery and reading into trip records
//!
//! Batches follow the `<dataset>_<YYYY>-<MM>.<ext>` naming convention. Which
//! batches to load is decided by a [`BatchPlan`]; how an identifier becomes
//! records is decided by a [`BatchReader`].

use crate::error::{DemandError, Result};
use crate::records::{parse_timestamp, CategoricalField, NumericField, TripRecord, PICKUP_COLUMN};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use polars::prelude::*;
use serde::Deserialize;
use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Alternative pickup column names (green taxi batches use `lpep_`)
const PICKUP_ALIASES: [&str; 2] = [PICKUP_COLUMN, "lpep_pickup_datetime"];

/// On-disk format of the source batches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchFormat {
    #[default]
    Parquet,
    Csv,
}

impl BatchFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            BatchFormat::Parquet => "parquet",
            BatchFormat::Csv => "csv",
        }
    }
}

impl FromStr for BatchFormat {
    type Err = DemandError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "parquet" => Ok(BatchFormat::Parquet),
            "csv" => Ok(BatchFormat::Csv),
            other => Err(DemandError::Config(format!(
                "Unsupported batch format: {}",
                other
            ))),
        }
    }
}

/// Identifier of one monthly batch of a dataset
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BatchId {
    dataset: String,
    year: i32,
    month: u32,
}

impl BatchId {
    pub fn new(dataset: impl Into<String>, year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(DemandError::InvalidParameter(format!(
                "Month must be between 1 and 12, got {}",
                month
            )));
        }

        Ok(Self {
            dataset: dataset.into(),
            year,
            month,
        })
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// File name without extension, e.g. `yellow_tripdata_2024-01`
    pub fn file_stem(&self) -> String {
        format!("{}_{:04}-{:02}", self.dataset, self.year, self.month)
    }

    pub fn file_name(&self, format: BatchFormat) -> String {
        format!("{}.{}", self.file_stem(), format.extension())
    }

    /// Recognise a file name of `dataset` in the given format
    pub fn parse_file_name(name: &str, dataset: &str, format: BatchFormat) -> Option<Self> {
        let stem = name.strip_suffix(format.extension())?.strip_suffix('.')?;
        let period = stem.strip_prefix(dataset)?.strip_prefix('_')?;
        let (year, month) = period.split_once('-')?;

        if year.len() != 4 || month.len() != 2 {
            return None;
        }

        let year = year.parse().ok()?;
        let month = month.parse().ok()?;
        Self::new(dataset, year, month).ok()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_stem())
    }
}

/// Ordered, duplicate-free list of batches to load.
///
/// Batches are kept in file name order, which is the concatenation order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchPlan {
    batches: Vec<BatchId>,
}

impl BatchPlan {
    pub fn new(batches: Vec<BatchId>) -> Self {
        let mut batches = batches;
        batches.sort_by_key(|batch| batch.file_stem());
        batches.dedup();
        Self { batches }
    }

    /// All twelve monthly batches of `year`
    pub fn year(dataset: &str, year: i32) -> Result<Self> {
        let batches = (1..=12)
            .map(|month| BatchId::new(dataset, year, month))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(batches))
    }

    /// Add one explicit month to the plan
    pub fn with_month(self, dataset: &str, year: i32, month: u32) -> Result<Self> {
        let mut batches = self.batches;
        batches.push(BatchId::new(dataset, year, month)?);
        Ok(Self::new(batches))
    }

    pub fn batches(&self) -> &[BatchId] {
        &self.batches
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

/// Turns a batch identifier into trip records
pub trait BatchReader {
    /// Read every row of one batch, in source order
    fn read_batch(&self, batch: &BatchId) -> Result<Vec<TripRecord>>;
}

/// Reads batches from files in a single directory
#[derive(Debug, Clone)]
pub struct DirectoryReader {
    dir: PathBuf,
    format: BatchFormat,
}

impl DirectoryReader {
    pub fn new<P: AsRef<Path>>(dir: P, format: BatchFormat) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            format,
        }
    }

    pub fn path_for(&self, batch: &BatchId) -> PathBuf {
        self.dir.join(batch.file_name(self.format))
    }

    /// Batches of `dataset` present in the directory, in file name order
    pub fn discover(&self, dataset: &str) -> Result<Vec<BatchId>> {
        let mut found = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            if let Some(batch) = name
                .to_str()
                .and_then(|name| BatchId::parse_file_name(name, dataset, self.format))
            {
                found.push(batch);
            }
        }

        Ok(BatchPlan::new(found).batches)
    }
}

impl BatchReader for DirectoryReader {
    fn read_batch(&self, batch: &BatchId) -> Result<Vec<TripRecord>> {
        let path = self.path_for(batch);
        if !path.is_file() {
            return Err(DemandError::MissingSource { path });
        }

        debug!(batch = %batch, path = %path.display(), "reading batch");
        match self.format {
            BatchFormat::Parquet => read_parquet(&path, &batch.to_string()),
            BatchFormat::Csv => read_csv(&path, &batch.to_string()),
        }
    }
}

/// Read a Parquet batch with polars
pub fn read_parquet(path: &Path, source_id: &str) -> Result<Vec<TripRecord>> {
    let file = File::open(path)?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DemandError::malformed(source_id, e))?;

    frame_to_records(&df, source_id)
}

/// Convert a polars DataFrame into trip records.
///
/// Required columns must be present; numeric columns must cast to floats
/// without losing values. Unparseable pickup strings become `None`.
pub fn frame_to_records(df: &DataFrame, source_id: &str) -> Result<Vec<TripRecord>> {
    let pickups = pickup_values(find_column(df, &PICKUP_ALIASES, source_id)?, source_id)?;

    let mut numeric = Vec::with_capacity(NumericField::ALL.len());
    for field in NumericField::ALL {
        let series = find_column(df, &numeric_column_names(field), source_id)?;
        numeric.push((field, numeric_values(series, source_id)?));
    }

    let mut categorical = Vec::with_capacity(CategoricalField::ALL.len());
    for field in CategoricalField::ALL {
        let series = find_column(df, &[field.column()], source_id)?;
        categorical.push((field, text_values(series, source_id)?));
    }

    let records = pickups
        .into_iter()
        .enumerate()
        .map(|(row, pickup)| {
            let mut record = TripRecord {
                pickup,
                ..TripRecord::default()
            };
            for (field, values) in &numeric {
                record.set_numeric(*field, values[row]);
            }
            for (field, values) in &categorical {
                record.set_categorical(*field, values[row].clone());
            }
            record
        })
        .collect();

    Ok(records)
}

fn numeric_column_names(field: NumericField) -> Vec<&'static str> {
    std::iter::once(field.column())
        .chain(field.aliases().iter().copied())
        .collect()
}

/// Accepted names for every column a batch must carry
fn required_columns() -> Vec<Vec<&'static str>> {
    let mut columns = vec![PICKUP_ALIASES.to_vec()];
    columns.extend(NumericField::ALL.into_iter().map(numeric_column_names));
    columns.extend(CategoricalField::ALL.iter().map(|field| vec![field.column()]));
    columns
}

fn find_column<'a>(df: &'a DataFrame, names: &[&str], source_id: &str) -> Result<&'a Series> {
    names
        .iter()
        .find_map(|name| df.column(name).ok())
        .ok_or_else(|| DemandError::malformed(source_id, format!("missing column '{}'", names[0])))
}

fn numeric_values(series: &Series, source_id: &str) -> Result<Vec<Option<f64>>> {
    let cast = series
        .strict_cast(&DataType::Float64)
        .map_err(|e| DemandError::malformed(source_id, format!("column '{}': {}", series.name(), e)))?;
    let values = cast.f64()?.into_iter().map(present).collect();
    Ok(values)
}

/// NaN and infinities count as missing
fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn text_values(series: &Series, source_id: &str) -> Result<Vec<Option<String>>> {
    let cast = series
        .strict_cast(&DataType::Utf8)
        .map_err(|e| DemandError::malformed(source_id, format!("column '{}': {}", series.name(), e)))?;
    let values = cast
        .utf8()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect();
    Ok(values)
}

fn pickup_values(series: &Series, source_id: &str) -> Result<Vec<Option<NaiveDateTime>>> {
    match series.dtype() {
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            Ok(series
                .datetime()?
                .into_iter()
                .map(|value| value.and_then(|value| from_epoch(value, unit)))
                .collect())
        }
        DataType::Date => Ok(series
            .date()?
            .into_iter()
            .map(|days| days.and_then(from_epoch_days))
            .collect()),
        DataType::Utf8 => Ok(series
            .utf8()?
            .into_iter()
            .map(|value| value.and_then(parse_timestamp))
            .collect()),
        other => Err(DemandError::malformed(
            source_id,
            format!("column '{}' has unsupported type {}", series.name(), other),
        )),
    }
}

fn from_epoch(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let per_second: i64 = match unit {
        TimeUnit::Nanoseconds => 1_000_000_000,
        TimeUnit::Microseconds => 1_000_000,
        TimeUnit::Milliseconds => 1_000,
    };
    let seconds = value.div_euclid(per_second);
    let nanos = value.rem_euclid(per_second) * (1_000_000_000 / per_second);

    DateTime::<Utc>::from_timestamp(seconds, nanos as u32).map(|ts| ts.naive_utc())
}

fn from_epoch_days(days: i32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1970, 1, 1)?
        .checked_add_signed(Duration::days(days as i64))?
        .and_hms_opt(0, 0, 0)
}

/// One CSV row, named after the TLC trip record columns
#[derive(Debug, Deserialize)]
struct CsvTripRow {
    #[serde(rename = "tpep_pickup_datetime", alias = "lpep_pickup_datetime")]
    pickup: Option<String>,
    trip_distance: Option<f64>,
    fare_amount: Option<f64>,
    total_amount: Option<f64>,
    passenger_count: Option<f64>,
    congestion_surcharge: Option<f64>,
    #[serde(rename = "Airport_fee", alias = "airport_fee")]
    airport_fee: Option<f64>,
    #[serde(rename = "RatecodeID")]
    rate_code: Option<f64>,
    store_and_fwd_flag: Option<String>,
}

impl From<CsvTripRow> for TripRecord {
    fn from(row: CsvTripRow) -> Self {
        TripRecord {
            pickup: row.pickup.as_deref().and_then(parse_timestamp),
            trip_distance: present(row.trip_distance),
            fare_amount: present(row.fare_amount),
            total_amount: present(row.total_amount),
            passenger_count: present(row.passenger_count),
            congestion_surcharge: present(row.congestion_surcharge),
            airport_fee: present(row.airport_fee),
            rate_code: present(row.rate_code),
            store_and_fwd_flag: row.store_and_fwd_flag.filter(|flag| !flag.is_empty()),
        }
    }
}

/// Read a CSV batch with a header row
pub fn read_csv(path: &Path, source_id: &str) -> Result<Vec<TripRecord>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| DemandError::malformed(source_id, e))?;

    // serde would quietly fill an absent column with None
    let headers = reader
        .headers()
        .map_err(|e| DemandError::malformed(source_id, e))?
        .clone();
    for names in required_columns() {
        if !names.iter().any(|name| headers.iter().any(|header| header == *name)) {
            return Err(DemandError::malformed(
                source_id,
                format!("missing column '{}'", names[0]),
            ));
        }
    }

    let mut records = Vec::new();
    for row in reader.deserialize::<CsvTripRow>() {
        let row = row.map_err(|e| DemandError::malformed(source_id, e))?;
        records.push(TripRecord::from(row));
    }

    Ok(records)
}
