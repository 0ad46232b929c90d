//! Build output listing.
//!
//! The build script drops its results either directly in the output
//! directory or in one level of per-run subfolders, e.g.
//! `commands_20250829/file1.update`.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::{
    errors::CatalogResult,
    scanner::{self, ScanOptions},
};

#[cfg(test)]
#[path = "outputs_tests.rs"]
mod tests;

/// Relative paths of the files in `root` and its immediate subdirectories.
///
/// The directory is created when missing. Paths are sorted and use `/`
/// separators.
pub fn list_output_files(root: &Path) -> CatalogResult<Vec<String>> {
    if !root.exists() {
        warn!(dir = %root.display(), "Output directory does not exist, creating it");
    }

    let options = ScanOptions {
        recursive: true,
        flat_structure: true,
        max_depth: 2,
        ..ScanOptions::default()
    };

    let mut files = Vec::new();
    for entry in scanner::scan(root, options)? {
        let entry = entry?;
        if let Some(reason) = &entry.error {
            warn!(
                path = %entry.relative_path.display(),
                "Skipping unreadable output entry: {}",
                reason
            );
            continue;
        }
        debug!(file = %entry.relative_path.display(), "Found output file");
        files.push(entry.relative_path_string());
    }
    files.sort();

    info!(dir = %root.display(), count = files.len(), "Listed output files");
    Ok(files)
}
