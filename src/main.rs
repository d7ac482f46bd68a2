use anyhow::{Context, Result};
use clap::Parser;
use cv_studio::cli::{handle_command, StudioCli};
use cv_studio::core::ConfigManager;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::info;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "cv_studio=info,rocket=warn";

fn init_tracing(json_log: Option<&Path>) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match json_log {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true) // Clear file on startup
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(file)
                        .with_current_span(false)
                        .with_span_list(false),
                )
                .with(filter)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = StudioCli::parse();
    init_tracing(cli.json_log.as_deref())?;

    let config = ConfigManager::load()?;
    info!(
        "Environment: {}",
        std::env::var("CV_STUDIO_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    );
    info!("Data: {}", config.environment.data_path.display());

    handle_command(cli.command, config).await
}
