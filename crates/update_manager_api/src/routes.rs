//! HTTP routing configuration
//!
//! # Route Structure
//!
//! - GET    / - Service banner
//! - GET    /health - Health check
//! - GET    /archives/list - List archived update packages
//! - GET    /archives/download/*path - Download an archived file
//! - POST   /inputs/serial-numbers - Save the device serial number
//! - POST   /inputs/json-file - Save the commands JSON file
//! - POST   /upload - Store an uploaded file
//! - GET    /command/:filename - Download a stored upload
//! - POST   /pipeline/start - Run the command pipeline launcher
//! - GET    /builder/build - Builder banner
//! - POST   /builder/build_update - Start a background build
//! - POST   /builder/upload_debs - Replace the Debian packages
//! - GET    /builder/output_files - List build outputs
//! - GET    /builder/download/*path - Download a build output
//!
//! Downloads, uploads and the pipeline launcher are not subject to the
//! request timeout.

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

use crate::{handlers, middleware as api_middleware, AppState};

/// Request timeout for the short JSON endpoints.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Create the complete API router with all routes configured.
///
/// This function sets up:
/// - All endpoint routes
/// - CORS configuration
/// - Request tracing
/// - Timeout handling
/// - Upload body limit
pub fn create_router(state: AppState) -> Router {
    // Configure CORS for the operator web UI
    let cors = CorsLayer::new()
        // Allow requests from any origin
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_DISPOSITION])
        .allow_credentials(false)
        // Cache preflight responses for 1 hour
        .max_age(Duration::from_secs(3600));

    // Configure request tracing
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().include_headers(true))
        .on_response(DefaultOnResponse::new().include_headers(true));

    let timed_routes = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/archives/list", get(handlers::list_archive_files))
        .route("/inputs/serial-numbers", post(handlers::save_serial_numbers))
        .route("/builder/build", get(handlers::builder_info))
        .route("/builder/build_update", post(handlers::trigger_build))
        .route("/builder/output_files", get(handlers::list_output_files))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT));

    let streaming_routes = Router::new()
        .route(
            "/archives/download/*file_path",
            get(handlers::download_archive_file),
        )
        .route(
            "/builder/download/*file_path",
            get(handlers::download_output_file),
        )
        .route("/command/:filename", get(handlers::download_uploaded_file))
        .route("/pipeline/start", post(handlers::start_pipeline));

    let upload_routes = Router::new()
        .route("/inputs/json-file", post(handlers::receive_commands_file))
        .route("/upload", post(handlers::upload_file))
        .route("/builder/upload_debs", post(handlers::upload_debs))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes));

    Router::new()
        .merge(timed_routes)
        .merge(streaming_routes)
        .merge(upload_routes)
        .layer(middleware::from_fn(api_middleware::tracing_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
