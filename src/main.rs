//! Cardioscore: Heart-failure mortality risk scoring service
//!
//! Main entry point for the HTTP server.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardioscore::adapters::sanitize::{self, SanitizingMakeWriter};
use cardioscore::adapters::ArtifactStore;
use cardioscore::application::{ModelState, ScoringService};
use cardioscore::config::{LogMode, ServiceConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServiceConfig::parse();

    // Initialize logging.
    //
    // - stdout/auto: log to stdout (so `docker logs` works)
    // - file: append to --log-file
    let (writer, _guard) = match config.log_mode {
        LogMode::File => {
            if let Some(parent) = config.log_file.parent() {
                // Best-effort: don't fail startup just because the directory is missing.
                let _ = std::fs::create_dir_all(parent);
            }

            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.log_file)
                .with_context(|| format!("failed to open log file {}", config.log_file.display()))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Auto | LogMode::Stdout => tracing_appender::non_blocking(std::io::stdout()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();
    sanitize::install_panic_hook();

    tracing::info!("Starting Cardioscore...");

    let store = ArtifactStore::new(&config.model_dir);
    let state = ModelState::load(&store, config.require_manifest);
    tracing::info!(
        "Model status: {}",
        if state.is_ready() { "loaded" } else { "not loaded" }
    );
    if config.range_validation {
        tracing::info!("Range validation enabled");
    }

    let scoring = ScoringService::new(state, config.scoring_options());
    cardioscore::web::serve(&config, scoring)
        .await
        .context("server failed")?;

    tracing::info!("Cardioscore shutdown complete.");
    Ok(())
}
