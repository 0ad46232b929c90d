//! Update Manager REST API
//!
//! HTTP surface of the Stratus remote update manager: archive listing and
//! downloads, operator inputs, Debian package uploads and the build and
//! command pipelines.
//!
//! # Architecture
//!
//! This crate exists in the HTTP layer and handles:
//! - HTTP request/response translation
//! - Error mapping from domain to HTTP
//! - Routing and server configuration
//!
//! All filesystem and process work lives in `update_manager_core`. The
//! dependency flows: HTTP API → core, never the reverse.

use std::sync::Arc;

use update_manager_core::{ArchiveCatalogBuilder, ManagerConfig, ScriptRunner, ShellScriptRunner};

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

// Re-export key types for convenience
pub use errors::{ApiError, ErrorResponse};
pub use models::{request, response};
pub use server::{ApiConfig, ApiServer};

/// Default API port
pub const DEFAULT_PORT: u16 = 8000;

/// Default upper bound for multipart upload bodies (1 GiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Filesystem locations and script settings
    pub config: Arc<ManagerConfig>,

    /// Archive listing, rooted at the configured archive directory
    pub catalog: ArchiveCatalogBuilder,

    /// Executes the build, archive and launcher scripts
    pub runner: Arc<dyn ScriptRunner>,

    /// Largest accepted upload body in bytes
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Create application state that runs scripts as real processes.
    pub fn new(config: ManagerConfig) -> Self {
        Self::with_runner(config, Arc::new(ShellScriptRunner::new()))
    }

    /// Create application state with a custom script runner.
    pub fn with_runner(config: ManagerConfig, runner: Arc<dyn ScriptRunner>) -> Self {
        let catalog = ArchiveCatalogBuilder::new(config.catalog_config());
        Self {
            config: Arc::new(config),
            catalog,
            runner,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}
