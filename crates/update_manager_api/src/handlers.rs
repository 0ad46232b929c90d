//! HTTP request handlers
//!
//! Handlers validate the request, hand filesystem work to the blocking pool
//! and translate domain results into response models. Domain errors convert
//! into [`ApiError`] with `?`.

use std::path::PathBuf;

use axum::{
    body::Body,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        multipart::MultipartRejection,
        Multipart, Path, Query, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tokio_util::io::ReaderStream;
use tracing::{error, info, warn};
use update_manager_core::{
    inputs::{self, SerialNumbers},
    outputs,
    packages::{self, UploadedFile},
    resolve_download,
    scripts::launcher_invocation,
    ArchiveCatalog, BuildPipeline, CatalogError, ListOptions,
};

use crate::{
    errors::ApiError,
    models::{
        request::{ListArchiveQuery, SerialNumbersRequest},
        response::{
            HealthCheckResponse, MessageResponse, OutputFilesResponse, PipelineStartResponse,
            SerialNumberResponse, UploadDebsResponse, UploadResponse,
        },
    },
    AppState,
};

/// Multipart field holding the file for the single file uploads.
const FILE_FIELD: &str = "file";

/// Run blocking filesystem work off the async runtime.
async fn run_blocking<T, E, F>(task: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ApiError::internal(format!("Background task failed: {}", e)))?
        .map_err(Into::into)
}

/// GET /
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new("Stratus Update Manager API"))
}

/// GET /health
///
/// Returns service health status with version and timestamp.
pub async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

// ============================================================================
// Archive
// ============================================================================

/// GET /archives/list
///
/// Lists the archive newest build first. Entries that cannot be inspected
/// carry an `error` field; only a failure to read the archive root fails the
/// request.
pub async fn list_archive_files(
    State(state): State<AppState>,
    query: Result<Query<ListArchiveQuery>, QueryRejection>,
) -> Result<Json<ArchiveCatalog>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    let options = ListOptions::from(query);
    info!(
        include_details = options.include_details,
        filter_ext = ?options.filter_ext,
        recursive = options.recursive,
        flat_structure = options.flat_structure,
        "Listing archive"
    );

    let catalog = state.catalog.clone();
    let listing = run_blocking(move || catalog.list(&options))
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list archive files: {}", e)))?;

    info!(
        count = listing.items.len(),
        truncated = listing.truncated,
        "Archive listed"
    );
    Ok(Json(listing))
}

/// GET /archives/download/*path
pub async fn download_archive_file(
    State(state): State<AppState>,
    Path(file_path): Path<String>,
) -> Result<Response, ApiError> {
    stream_file(state.catalog.root().to_path_buf(), file_path).await
}

// ============================================================================
// Operator inputs
// ============================================================================

/// POST /inputs/serial-numbers
pub async fn save_serial_numbers(
    State(state): State<AppState>,
    body: Result<Json<SerialNumbersRequest>, JsonRejection>,
) -> Result<Json<SerialNumberResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::validation(e.body_text()))?;
    let serial = SerialNumbers::from(request).validate()?;

    let path = state.config.paths.serial_file.clone();
    let saved = serial.clone();
    run_blocking(move || inputs::save_serial_number(&path, &saved)).await?;

    Ok(Json(SerialNumberResponse {
        message: "Serial numbers saved successfully".to_string(),
        serial_number: serial,
    }))
}

/// POST /inputs/json-file
///
/// Expects the commands file in the multipart field `file`.
pub async fn receive_commands_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::validation(e.body_text()))?;

    let mut contents = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            contents = Some(field.bytes().await?);
            break;
        }
    }
    let contents = contents.ok_or_else(|| {
        ApiError::validation(format!("Missing multipart field '{}'", FILE_FIELD))
    })?;

    let path = state.config.paths.commands_json.clone();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    run_blocking(move || inputs::save_commands_json(&path, &contents)).await?;

    Ok(Json(MessageResponse::new(format!(
        "File saved successfully as {}",
        file_name
    ))))
}

/// POST /upload
///
/// Stores the multipart field `file` in the uploads directory under its base
/// name.
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::validation(e.body_text()))?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| ApiError::validation("Uploaded file has no file name"))?;
        let contents = field.bytes().await?;
        info!(file = %file_name, bytes = contents.len(), "Received upload");
        upload = Some(UploadedFile {
            file_name,
            contents: contents.to_vec(),
        });
        break;
    }
    let upload = upload.ok_or_else(|| {
        ApiError::validation(format!("Missing multipart field '{}'", FILE_FIELD))
    })?;

    let dir = state.config.paths.uploads_dir.clone();
    let saved = run_blocking(move || packages::save_upload(&dir, &upload)).await?;

    Ok(Json(UploadResponse::saved(&saved)))
}

/// GET /command/:filename
///
/// Returns a file previously stored by `POST /upload`.
pub async fn download_uploaded_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    stream_file(state.config.paths.uploads_dir.clone(), filename).await
}

// ============================================================================
// Pipelines
// ============================================================================

/// POST /pipeline/start
///
/// Runs the command launcher and waits for it to exit.
pub async fn start_pipeline(
    State(state): State<AppState>,
) -> Result<Json<PipelineStartResponse>, ApiError> {
    let invocation = launcher_invocation(&state.config.scripts);
    let output = state.runner.run(&invocation).await?;
    output.log("launcher");

    Ok(Json(PipelineStartResponse {
        message: "Pipeline started successfully".to_string(),
        exit_code: output.exit_code,
    }))
}

/// GET /builder/build
pub async fn builder_info() -> Json<MessageResponse> {
    Json(MessageResponse::new("Update builder endpoint"))
}

/// POST /builder/build_update
///
/// Starts the build pipeline in the background and returns 202 without
/// waiting for it.
pub async fn trigger_build(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let pipeline = BuildPipeline::new(state.config.scripts.clone());
    pipeline.check_ready()?;

    let runner = state.runner.clone();
    tokio::spawn(async move {
        let report = pipeline.run(runner.as_ref()).await;
        if report.succeeded() {
            info!("Build pipeline completed");
        } else {
            error!("Build pipeline did not complete");
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse::new(
            "Pipeline started in background. Archival will run automatically upon successful build.",
        )),
    ))
}

// ============================================================================
// Builder packages and outputs
// ============================================================================

/// POST /builder/upload_debs
///
/// Accepts any number of file fields. `.deb` files are taken as-is and
/// `.zip` files are searched for `.deb` entries; the result replaces the
/// contents of the debs directory.
pub async fn upload_debs(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadDebsResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::validation(e.body_text()))?;

    let mut uploads = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            warn!(field = ?field.name(), "Ignoring non-file form field");
            continue;
        };
        let contents = field.bytes().await?;
        info!(file = %file_name, bytes = contents.len(), "Received upload");
        uploads.push(UploadedFile {
            file_name,
            contents: contents.to_vec(),
        });
    }

    let debs_dir = state.config.paths.debs_dir.clone();
    let target = debs_dir.clone();
    let installed = run_blocking(move || {
        let staged = packages::stage_uploads(&uploads)?;
        if staged.is_empty() {
            return Ok(None);
        }
        packages::install_debs(&target, &staged).map(Some)
    })
    .await?;

    let response = match installed {
        Some(files) => UploadDebsResponse::installed(files, &debs_dir),
        None => {
            warn!("Upload contained no .deb files");
            UploadDebsResponse::nothing_found()
        }
    };
    Ok(Json(response))
}

/// GET /builder/output_files
pub async fn list_output_files(
    State(state): State<AppState>,
) -> Result<Json<OutputFilesResponse>, ApiError> {
    let root = state.config.paths.output_dir.clone();
    let files = run_blocking(move || outputs::list_output_files(&root)).await?;

    Ok(Json(OutputFilesResponse { files }))
}

/// GET /builder/download/*path
pub async fn download_output_file(
    State(state): State<AppState>,
    Path(file_path): Path<String>,
) -> Result<Response, ApiError> {
    stream_file(state.config.paths.output_dir.clone(), file_path).await
}

/// Stream a file under `root` as an attachment.
async fn stream_file(root: PathBuf, relative: String) -> Result<Response, ApiError> {
    let resolved = run_blocking(move || resolve_download(&root, &relative)).await?;

    let file = tokio::fs::File::open(&resolved.path)
        .await
        .map_err(|e| CatalogError::io("open", &resolved.path, e))?;
    info!(
        path = %resolved.path.display(),
        bytes = resolved.size,
        "Streaming download"
    );

    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        ),
        (
            header::CONTENT_DISPOSITION,
            content_disposition(&resolved.file_name),
        ),
        (header::CONTENT_LENGTH, HeaderValue::from(resolved.size)),
    ];

    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

/// `attachment` disposition naming `file_name`, reduced to printable ASCII.
fn content_disposition(file_name: &str) -> HeaderValue {
    let safe: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    HeaderValue::from_str(&format!("attachment; filename=\"{}\"", safe))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
