//! End-to-end forecasting run
//!
//! Load → explore → clean → aggregate → split → fit on train and evaluate →
//! refit on the full series and forecast. Each stage's failure is tagged with
//! the stage name and stops the run.

use crate::aggregation::{aggregate_daily, aggregate_hourly, DailySeries};
use crate::cleaning::{Cleaner, CleaningReport};
use crate::config::PipelineConfig;
use crate::data::{BatchReader, DirectoryReader};
use crate::eda::{records_frame, summarize, DatasetSummary};
use crate::error::{AtStage, Stage, StageError};
use crate::evaluation::{evaluate, Evaluation, Fold};
use crate::loader::{LoadReport, Loader};
use crate::models::{forecast_frame, series_frame, FittedForecaster, ForecastPoint, Forecaster, SeasonalTrend};
use crate::split::train_test_split;
use polars::prelude::DataFrame;
use std::fmt;
use tracing::info;

/// Everything a run produces, ready for printing
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub load: LoadReport,
    pub summary: DatasetSummary,
    pub cleaning: CleaningReport,
    pub daily: DailySeries,
    pub hourly_points: usize,
    pub train_len: usize,
    pub test_len: usize,
    pub model: String,
    pub evaluation: Evaluation,
    /// Forecast of the held-out days from the train-only fit
    pub test_forecast: Vec<ForecastPoint>,
    /// Forecast of the days after the full series
    pub future_forecast: Vec<ForecastPoint>,
    pub folds: Vec<Fold>,
    records_preview: DataFrame,
    daily_preview: DataFrame,
    forecast_preview: DataFrame,
}

/// Run the pipeline on the configured batch directory
pub fn run(config: &PipelineConfig) -> Result<PipelineReport, StageError> {
    let reader = DirectoryReader::new(&config.data_dir, config.format);
    run_with_reader(config, reader)
}

/// Run the pipeline, reading batches through `reader`
pub fn run_with_reader<R: BatchReader>(
    config: &PipelineConfig,
    reader: R,
) -> Result<PipelineReport, StageError> {
    let plan = config.batch_plan().at_stage(Stage::Config)?;
    let window = config.window().at_stage(Stage::Config)?;
    let model = SeasonalTrend::new(config.interval_width, config.weekly_seasonality)
        .at_stage(Stage::Config)?;

    info!(batches = plan.len(), window = %window, "loading");
    let loaded = Loader::new(reader).load(&plan, &window).at_stage(Stage::Load)?;

    let summary = summarize(&loaded.records);
    let records_preview = records_frame(&loaded.records, config.preview_rows).at_stage(Stage::Explore)?;

    let cleaned = Cleaner::default().clean(&loaded.records).at_stage(Stage::Clean)?;
    drop(loaded.records);

    let daily = aggregate_daily(&cleaned.records);
    let hourly = aggregate_hourly(&cleaned.records);
    info!(days = daily.len(), hours = hourly.len(), "aggregated");
    let daily_preview = series_frame(&daily)
        .map(|df| df.head(Some(config.preview_rows)))
        .at_stage(Stage::Explore)?;

    // The split happens before any model sees the data
    let split = train_test_split(&daily, config.test_size).at_stage(Stage::Split)?;
    info!(train = split.train.len(), test = split.test.len(), "split");

    let fitted = model.fit(&split.train).at_stage(Stage::Forecast)?;
    let forecast = fitted.forecast(config.test_size).at_stage(Stage::Forecast)?;
    let test_forecast = tail(forecast, config.test_size);

    let evaluation = evaluate(&split.test, &test_forecast).at_stage(Stage::Evaluate)?;
    info!(
        mae = evaluation.metrics.mae,
        rmse = evaluation.metrics.rmse,
        "evaluated on held-out days"
    );

    let full = model.fit(&daily).at_stage(Stage::Forecast)?;
    let future_forecast = tail(full.forecast(config.horizon).at_stage(Stage::Forecast)?, config.horizon);
    let forecast_preview = forecast_frame(&future_forecast)
        .map(|df| df.tail(Some(config.preview_rows)))
        .at_stage(Stage::Forecast)?;

    let folds = match &config.cross_validation {
        Some(cv) => cv.run(&model, &daily).at_stage(Stage::Evaluate)?,
        None => Vec::new(),
    };

    info!(model = model.name(), horizon = config.horizon, "forecast finished");

    Ok(PipelineReport {
        load: loaded.report,
        summary,
        cleaning: cleaned.report,
        train_len: split.train.len(),
        test_len: split.test.len(),
        hourly_points: hourly.len(),
        daily,
        model: model.name().to_string(),
        evaluation,
        test_forecast,
        future_forecast,
        folds,
        records_preview,
        daily_preview,
        forecast_preview,
    })
}

fn tail(mut points: Vec<ForecastPoint>, n: usize) -> Vec<ForecastPoint> {
    let start = points.len().saturating_sub(n);
    points.split_off(start)
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== Load ==")?;
        writeln!(f, "{}", self.load)?;
        writeln!(f)?;

        writeln!(f, "== Raw data ==")?;
        writeln!(f, "{}", self.records_preview)?;
        write!(f, "{}", self.summary)?;
        writeln!(f)?;

        writeln!(f, "== Cleaning ==")?;
        write!(f, "{}", self.cleaning)?;
        writeln!(f)?;

        writeln!(f, "== Daily series ==")?;
        writeln!(
            f,
            "{} days, {} trips, {} hourly points",
            self.daily.len(),
            self.daily.total(),
            self.hourly_points
        )?;
        writeln!(f, "{}", self.daily_preview)?;
        writeln!(f)?;

        writeln!(f, "== Evaluation ==")?;
        writeln!(f, "Model: {}", self.model)?;
        writeln!(f, "Train: {} days, test: {} days", self.train_len, self.test_len)?;
        write!(f, "{}", self.evaluation.metrics)?;
        for fold in &self.folds {
            writeln!(f, "  {}", fold)?;
        }
        writeln!(f)?;

        writeln!(f, "== Forecast ==")?;
        write!(f, "{}", self.forecast_preview)
    }
}
