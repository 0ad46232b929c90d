//! Update Manager API Server
//!
//! Main binary for running the API server.
//!
//! # Environment Variables
//!
//! - `API_PORT`: Port to listen on (default: 8000)
//! - `API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `RUST_LOG`: Log level (default: info)
//! - `UPDATE_MANAGER_CONFIG`: TOML configuration file (optional)
//! - `UPDATE_MANAGER_HOME`: Base directory for relative paths (default: the
//!   configuration file's directory, or the working directory)
//! - `API_MAX_UPLOAD_MB`: Largest accepted upload in MiB (default: 1024)

use std::{env, path::PathBuf};

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use update_manager_api::{ApiConfig, ApiServer, AppState, DEFAULT_PORT};
use update_manager_core::ManagerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration from environment
    let config = ApiConfig {
        port: match env::var("API_PORT") {
            Ok(port) => port
                .parse()
                .with_context(|| format!("Invalid API_PORT '{}'", port))?,
            Err(_) => DEFAULT_PORT,
        },
        host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
    };

    let manager_config = load_manager_config()?;
    tracing::info!(
        archive_dir = %manager_config.paths.archive_dir.display(),
        output_dir = %manager_config.paths.output_dir.display(),
        debs_dir = %manager_config.paths.debs_dir.display(),
        uploads_dir = %manager_config.paths.uploads_dir.display(),
        "Loaded update manager configuration"
    );

    let mut state = AppState::new(manager_config);
    if let Ok(limit) = env::var("API_MAX_UPLOAD_MB") {
        let megabytes: usize = limit
            .parse()
            .with_context(|| format!("Invalid API_MAX_UPLOAD_MB '{}'", limit))?;
        state = state.with_max_upload_bytes(megabytes.saturating_mul(1024 * 1024));
    }

    let server = ApiServer::new(config, state);

    tracing::info!(
        "Starting Update Manager API server v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Start server with graceful shutdown
    server.serve().await
}

/// Configuration file when given, otherwise the default layout, with
/// relative paths placed under the base directory.
fn load_manager_config() -> anyhow::Result<ManagerConfig> {
    let home = env::var_os("UPDATE_MANAGER_HOME").map(PathBuf::from);

    match env::var_os("UPDATE_MANAGER_CONFIG").map(PathBuf::from) {
        Some(path) => {
            let mut config = ManagerConfig::load(&path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            let base = home
                .or_else(|| path.parent().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("."));
            config.rebase(&base);
            Ok(config)
        }
        None => Ok(ManagerConfig::from_base_dir(
            home.unwrap_or_else(|| PathBuf::from(".")),
        )),
    }
}
