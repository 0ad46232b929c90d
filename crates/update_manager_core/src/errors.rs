//! Domain error types for the update manager.
//!
//! Each functional area has its own error enum so callers at the HTTP
//! boundary can map failures onto status codes without string matching.

use std::path::PathBuf;

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors raised while listing the archive or resolving a download path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("Access denied: attempting to access file outside {root}")]
    Forbidden { path: String, root: String },

    #[error("Path is not a file: {path}")]
    InvalidRequest { path: String },

    #[error("Failed to {operation} {path}: {reason}")]
    Internal {
        operation: String,
        path: String,
        reason: String,
    },
}

impl CatalogError {
    /// Wrap an I/O failure raised while performing `operation` on `path`.
    pub fn io(operation: &str, path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        CatalogError::Internal {
            operation: operation.to_string(),
            path: path.into().display().to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors raised while validating or persisting operator inputs.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Serial number cannot be empty")]
    EmptySerialNumber,

    #[error("Serial numbers do not match")]
    SerialNumberMismatch,

    #[error("Commands file is not valid JSON: {reason}")]
    InvalidJson { reason: String },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for input operations.
pub type InputResult<T> = Result<T, InputError>;

/// Errors raised while staging or installing uploaded Debian packages.
#[derive(Error, Debug)]
pub enum PackageError {
    #[error("Invalid upload file name: '{name}'")]
    InvalidFileName { name: String },

    #[error("Failed to read zip archive {name}: {reason}")]
    Zip { name: String, reason: String },

    #[error("Failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PackageError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PackageError::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for package operations.
pub type PackageResult<T> = Result<T, PackageError>;

/// Errors raised while running external scripts.
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Script not found at {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {seconds}s")]
    TimedOut { program: String, seconds: u64 },
}

/// Result type alias for script operations.
pub type ScriptResult<T> = Result<T, ScriptError>;

/// Errors raised while loading the service configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {reason}")]
    Parse { reason: String },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
