//! HTTP response type definitions
//!
//! All responses use camelCase JSON field names and omit absent optional
//! fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;

/// Generic acknowledgement.
///
/// ```json
/// { "message": "Build process started in background" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response of `POST /inputs/serial-numbers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerialNumberResponse {
    pub message: String,

    /// The confirmed, trimmed serial number
    pub serial_number: String,
}

/// Response of `POST /pipeline/start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStartResponse {
    pub message: String,

    /// Launcher exit status; absent when it was killed by a signal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

/// Response of `POST /builder/upload_debs`.
///
/// When the upload held no packages only `message` is present.
///
/// ```json
/// { "message": "Processed 2 .deb files into /srv/stratus/debs", "count": 2,
///   "files": ["core_1.0_arm64.deb", "ui_1.0_arm64.deb"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadDebsResponse {
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
}

impl UploadDebsResponse {
    pub fn installed(files: Vec<String>, debs_dir: &Path) -> Self {
        Self {
            message: format!(
                "Processed {} .deb files into {}",
                files.len(),
                debs_dir.display()
            ),
            count: Some(files.len()),
            files,
        }
    }

    pub fn nothing_found() -> Self {
        Self {
            message: "No valid .deb files found in the upload".to_string(),
            count: None,
            files: Vec::new(),
        }
    }
}

/// Response of `POST /upload`.
///
/// ```json
/// { "filename": "commands.txt", "message": "File saved to /srv/stratus/uploads/commands.txt" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Name the file was stored under
    pub filename: String,

    pub message: String,
}

impl UploadResponse {
    pub fn saved(path: &Path) -> Self {
        Self {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            message: format!("File saved to {}", path.display()),
        }
    }
}

/// Response of `GET /builder/output_files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputFilesResponse {
    /// Paths relative to the output directory, `/` separated
    pub files: Vec<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResponse {
    /// Service status: "healthy" or "unhealthy"
    pub status: String,

    /// Service version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Current timestamp (ISO 8601)
    pub timestamp: String,
}
