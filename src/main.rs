//! media-dl server binary
//!
//! Reads an optional JSON config file named by `MEDIA_DL_CONFIG`, applies the
//! `MEDIA_DL_*` environment overrides and serves the REST API until SIGINT or
//! SIGTERM.

use media_dl::{Config, MediaDownloader};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Path of an optional JSON configuration file
const ENV_CONFIG: &str = "MEDIA_DL_CONFIG";
/// Set to `json` for structured log lines
const ENV_LOG_FORMAT: &str = "MEDIA_DL_LOG_FORMAT";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match std::env::var(ENV_LOG_FORMAT).as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}

fn load_config() -> media_dl::Result<Config> {
    let config = match std::env::var_os(ENV_CONFIG) {
        Some(path) => Config::from_file(&PathBuf::from(path))?,
        None => Config::default(),
    };
    config.apply_env_overrides()
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = match load_config() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let downloader = match MediaDownloader::new((*config).clone()).await {
        Ok(downloader) => Arc::new(downloader),
        Err(e) => {
            tracing::error!(error = %e, "failed to initialize downloader");
            return ExitCode::FAILURE;
        }
    };

    match media_dl::api::start_api_server(downloader, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "API server failed");
            ExitCode::FAILURE
        }
    }
}
