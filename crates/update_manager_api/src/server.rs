//! Listener setup for the update manager API.
//!
//! [`ApiServer`] binds the router built by [`routes::create_router`] and runs
//! until the process receives SIGINT or SIGTERM.

use anyhow::Context;
use axum::Router;
use std::net::{IpAddr, SocketAddr};
use tokio::net::TcpListener;
use tokio::signal;

use crate::{routes, AppState, DEFAULT_PORT};

/// Address the update manager listens on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// TCP port, 8000 unless `API_PORT` says otherwise
    pub port: u16,

    /// IP address of the listening interface
    pub host: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl ApiConfig {
    /// `host` and `port` combined. Host names are not resolved; `host` must be
    /// a literal IPv4 or IPv6 address.
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let ip = self
            .host
            .parse::<IpAddr>()
            .map_err(|e| anyhow::anyhow!("Invalid API host '{}': {}", self.host, e))?;
        Ok(SocketAddr::from((ip, self.port)))
    }
}

/// The update manager HTTP service: listener address plus shared state.
pub struct ApiServer {
    config: ApiConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: ApiConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Router serving the archive, builder and pipeline endpoints.
    pub fn router(&self) -> Router {
        routes::create_router(self.state.clone())
    }

    /// Serve requests until SIGINT or SIGTERM arrives. In-flight requests
    /// finish before this returns; background builds are not waited for.
    ///
    /// Fails when the address is invalid or already in use.
    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = self.config.socket_addr()?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        tracing::info!(%addr, "Update manager listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Update manager stopped unexpectedly")?;

        tracing::info!("Update manager stopped");

        Ok(())
    }
}

/// Resolves on the first SIGINT or SIGTERM. A signal whose handler cannot be
/// installed is logged and ignored.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("SIGINT handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("SIGTERM handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("SIGINT received, draining requests");
        },
        _ = terminate => {
            tracing::info!("SIGTERM received, draining requests");
        },
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
