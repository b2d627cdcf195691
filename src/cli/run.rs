use crate::config::parse::{load_config, ConfigError};
use crate::pipeline::controller::{PipelineController, PipelineError};
use crate::sink::TracingSink;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::signal;
use tracing::info;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = match config_path {
        Some(path) => path,
        None => {
            eprintln!("Error: config not found");
            eprintln!("Searched locations:");
            eprintln!("  ~/.config/tarspool/config.yml");
            eprintln!("  /etc/tarspool/config.yml");
            eprintln!("\nUse --config <path> to specify a config file, or run 'tarspool config init' to generate one.");
            std::process::exit(1);
        }
    };

    run_pipeline(&config_path).await.map_err(|e| e.into())
}

async fn run_pipeline(config_path: &PathBuf) -> Result<(), RunError> {
    info!(config_path = %config_path.display(), "Loading configuration");
    let config = load_config(config_path)?;

    info!(
        source = %config.source.dir.display(),
        archive = %config.archive.dir.display(),
        batch_size = config.archive.batch_size,
        "Starting pipeline"
    );

    let sink = Arc::new(TracingSink);
    let mut controller = PipelineController::new(config, sink)?;
    controller.start().await?;

    info!("Pipeline started, press Ctrl+C to stop");
    signal::ctrl_c().await?;
    info!("Shutdown signal received");

    let stats = controller.stop().await?;
    info!(
        archives = stats.archives_written,
        files = stats.files_archived,
        "Pipeline shutdown complete"
    );

    Ok(())
}
