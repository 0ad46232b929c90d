//! Filesystem scanner for the archive catalog.
//!
//! Produces a flat, lazily evaluated sequence of [`ScanEntry`] values for a
//! root directory. The walk is depth-first and iterative (driven by
//! `walkdir`), so deep trees never grow the call stack.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::errors::{CatalogError, CatalogResult};

#[cfg(test)]
#[path = "scanner_tests.rs"]
mod tests;

/// Options controlling a directory scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Descend into subdirectories
    pub recursive: bool,

    /// Suppress directory records, yielding only files
    pub flat_structure: bool,

    /// Deepest level visited when `recursive` is set (1 = root children)
    pub max_depth: usize,

    /// Stop after this many entries have been yielded
    pub max_items: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            flat_structure: true,
            max_depth: crate::config::DEFAULT_MAX_DEPTH,
            max_items: crate::config::DEFAULT_MAX_ITEMS,
        }
    }
}

/// One file or directory found under the scan root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    /// Path as seen by the walker (root joined with `relative_path`)
    pub absolute_path: PathBuf,

    /// Path relative to the scan root
    pub relative_path: PathBuf,

    pub is_directory: bool,

    /// Set when the entry was found but could not be read
    pub error: Option<String>,
}

impl ScanEntry {
    /// Base name of the entry.
    pub fn name(&self) -> String {
        self.absolute_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Relative path rendered with `/` separators.
    pub fn relative_path_string(&self) -> String {
        self.relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Create `root` (and its parents) if it does not exist yet.
pub fn ensure_root(root: &Path) -> CatalogResult<()> {
    fs::create_dir_all(root).map_err(|e| CatalogError::io("create directory", root, e))
}

/// Start scanning `root`.
///
/// The root is created when absent. A failure to read the root itself is
/// yielded as an error. Failures below the root are yielded as entries with
/// [`ScanEntry::error`] set, or logged and skipped when the walker reports no
/// path for them.
pub fn scan(root: &Path, options: ScanOptions) -> CatalogResult<Scanner> {
    ensure_root(root)?;

    let max_depth = if options.recursive {
        options.max_depth.max(1)
    } else {
        1
    };

    debug!(root = %root.display(), max_depth, "Scanning directory");

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    Ok(Scanner {
        root: root.to_path_buf(),
        walker,
        flat_structure: options.flat_structure,
        max_items: options.max_items,
        yielded: 0,
        truncated: false,
        last_directory: None,
    })
}

/// Iterator over the entries of a directory tree.
pub struct Scanner {
    root: PathBuf,
    walker: walkdir::IntoIter,
    flat_structure: bool,
    max_items: usize,
    yielded: usize,
    truncated: bool,
    last_directory: Option<PathBuf>,
}

impl Scanner {
    /// Whether the walk stopped early because `max_items` was reached.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    fn classify(&self, entry: &walkdir::DirEntry) -> Option<bool> {
        let file_type = entry.file_type();
        if file_type.is_dir() {
            return Some(true);
        }
        if file_type.is_file() {
            return Some(false);
        }

        // Symlinks count as files only when they point at one; linked
        // directories are never descended into.
        match fs::metadata(entry.path()) {
            Ok(meta) if meta.is_file() => Some(false),
            _ => None,
        }
    }

    /// Turn a walker failure below the root into an entry carrying the error.
    ///
    /// An unreadable directory is reported by walkdir right after its own
    /// record; when that record was already yielded it carries the failure
    /// itself, so no second entry is produced.
    fn error_entry(&self, err: &walkdir::Error) -> Option<(PathBuf, bool, String)> {
        let reason = err
            .io_error()
            .map(ToString::to_string)
            .unwrap_or_else(|| err.to_string());

        let Some(path) = err.path() else {
            warn!("Skipping unreadable entry during scan: {}", err);
            return None;
        };

        let is_directory = path.is_dir();
        if is_directory && self.last_directory.as_deref() == Some(path) {
            warn!(path = %path.display(), "Directory could not be read: {}", reason);
            return None;
        }

        warn!(path = %path.display(), "Entry could not be read: {}", reason);
        Some((path.to_path_buf(), is_directory, reason))
    }

    fn emit(
        &mut self,
        absolute_path: PathBuf,
        is_directory: bool,
        error: Option<String>,
    ) -> Option<CatalogResult<ScanEntry>> {
        if self.yielded >= self.max_items {
            warn!(
                root = %self.root.display(),
                max_items = self.max_items,
                "Scan limit reached, listing truncated"
            );
            self.truncated = true;
            return None;
        }
        self.yielded += 1;

        let relative_path = match absolute_path.strip_prefix(&self.root) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => absolute_path
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_default(),
        };

        self.last_directory = is_directory.then(|| absolute_path.clone());

        Some(Ok(ScanEntry {
            absolute_path,
            relative_path,
            is_directory,
            error,
        }))
    }
}

impl Iterator for Scanner {
    type Item = CatalogResult<ScanEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.truncated {
            return None;
        }

        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    if err.depth() == 0 {
                        let reason = err.to_string();
                        return Some(Err(CatalogError::Internal {
                            operation: "read directory".to_string(),
                            path: self.root.display().to_string(),
                            reason,
                        }));
                    }
                    match self.error_entry(&err) {
                        Some((path, is_directory, reason)) => {
                            return self.emit(path, is_directory, Some(reason));
                        }
                        None => continue,
                    }
                }
            };

            let Some(is_directory) = self.classify(&entry) else {
                debug!(path = %entry.path().display(), "Skipping special file");
                continue;
            };

            if is_directory && self.flat_structure {
                continue;
            }

            return self.emit(entry.into_path(), is_directory, None);
        }
    }
}
