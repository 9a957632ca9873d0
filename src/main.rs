use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};

use flowstream::flowstream::config::AggregatorOptions;
use flowstream::flowstream::observability::PipelineMetrics;
use flowstream::flowstream::pipeline::runner::run_pipeline;

#[tokio::main]
async fn main() -> ExitCode {
    pretty_env_logger::init();

    let options = AggregatorOptions::parse();
    if let Err(error) = options.validate() {
        error!("{}", error);
        return ExitCode::from(2);
    }

    let metrics = match PipelineMetrics::new() {
        Ok(metrics) => Arc::new(metrics),
        Err(error) => {
            error!("failed to initialize metrics: {}", error);
            return ExitCode::from(2);
        }
    };

    info!("starting flow aggregation pipeline");
    match run_pipeline(options, metrics).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("pipeline failed: {}", error);
            ExitCode::FAILURE
        }
    }
}
