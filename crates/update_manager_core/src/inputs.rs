//! Operator inputs consumed by the command pipeline.
//!
//! The operator enters the device serial number twice and uploads a JSON
//! command set; both are written to fixed locations read by the pipeline
//! scripts.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{InputError, InputResult};

#[cfg(test)]
#[path = "inputs_tests.rs"]
mod tests;

/// Serial number entered twice for confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialNumbers {
    pub serial1: String,
    pub serial2: String,
}

impl SerialNumbers {
    /// Returns the confirmed serial number, trimmed.
    ///
    /// # Errors
    ///
    /// [`InputError::EmptySerialNumber`] if either entry is blank and
    /// [`InputError::SerialNumberMismatch`] if they differ.
    pub fn validate(&self) -> InputResult<String> {
        let first = self.serial1.trim();
        let second = self.serial2.trim();

        if first.is_empty() || second.is_empty() {
            return Err(InputError::EmptySerialNumber);
        }
        if first != second {
            return Err(InputError::SerialNumberMismatch);
        }

        Ok(first.to_string())
    }
}

/// Write `serial` followed by a newline to `path`, creating parent
/// directories as needed.
pub fn save_serial_number(path: &Path, serial: &str) -> InputResult<()> {
    write_creating_parents(path, format!("{}\n", serial).as_bytes())?;
    info!(path = %path.display(), "Saved serial number");
    Ok(())
}

/// Validate that `contents` is JSON and write it unchanged to `path`.
pub fn save_commands_json(path: &Path, contents: &[u8]) -> InputResult<()> {
    serde_json::from_slice::<serde_json::Value>(contents).map_err(|e| InputError::InvalidJson {
        reason: e.to_string(),
    })?;

    write_creating_parents(path, contents)?;
    info!(path = %path.display(), bytes = contents.len(), "Saved commands file");
    Ok(())
}

fn write_creating_parents(path: &Path, contents: &[u8]) -> InputResult<()> {
    let write_error = |source| InputError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    fs::write(path, contents).map_err(write_error)
}
