//! `taxi-forecast`: load, clean, aggregate, split, evaluate and forecast daily
//! taxi demand, printing a console report.
//!
//! Settings come from `TAXI_*` environment variables (see
//! [`taxi_demand::config`]); logs go to stderr and honour `RUST_LOG`.

use std::process::ExitCode;
use taxi_demand::error::AtStage;
use taxi_demand::{PipelineConfig, Stage};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let result = PipelineConfig::load()
        .at_stage(Stage::Config)
        .and_then(|config| taxi_demand::pipeline::run(&config));

    match result {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(stage = %err.stage, "run aborted");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
