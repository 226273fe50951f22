use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tokyo_gtfs::config::PipelineConfig;
use tokyo_gtfs::pipeline::Pipeline;

/// Where the dataset is written when `TOKYO_GTFS_OUTPUT` is unset.
const DEFAULT_OUTPUT: &str = "tokyo-gtfs.json";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tokyo_gtfs=info")),
        )
        .init();

    let Ok(config_path) = std::env::var("TOKYO_GTFS_CONFIG") else {
        error!("TOKYO_GTFS_CONFIG not set");
        return ExitCode::FAILURE;
    };
    let output = std::env::var("TOKYO_GTFS_OUTPUT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT));

    let config = match PipelineConfig::from_file(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let today = chrono::Local::now().date_naive();
    let (dataset, report) = match Pipeline::new(&config).run(today) {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "conversion failed");
            return ExitCode::FAILURE;
        }
    };

    let json = match serde_json::to_string(&dataset) {
        Ok(json) => json,
        Err(e) => {
            error!(error = %e, "failed to serialize dataset");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = std::fs::write(&output, json) {
        error!(error = %e, path = %output.display(), "failed to write dataset");
        return ExitCode::FAILURE;
    }

    info!(
        path = %output.display(),
        trips = dataset.trips.len(),
        stops = dataset.stops.len(),
        blocks = report.blocks,
        "wrote dataset"
    );
    ExitCode::SUCCESS
}
