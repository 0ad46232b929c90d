//! Safe resolution of client supplied paths.
//!
//! Download endpoints accept a path relative to a served root. The path is
//! normalized lexically before the filesystem is touched, so a traversal
//! attempt is rejected whether or not its target exists, and resolved again
//! after symlinks are followed.

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use tracing::{debug, warn};

use crate::errors::{CatalogError, CatalogResult};

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;

/// A regular file located under a served root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Canonical absolute path of the file
    pub path: PathBuf,

    /// Base name offered to the client
    pub file_name: String,

    pub size: u64,
}

/// Join `relative` onto `root` without touching the filesystem.
///
/// Returns `None` if the result would leave `root`: absolute or prefixed
/// components, or more `..` segments than there are directories to pop.
pub fn join_within(root: &Path, relative: &str) -> Option<PathBuf> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();

    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(parts.iter().fold(root.to_path_buf(), |path, part| path.join(part)))
}

/// Resolve `relative` to a regular file under `root`.
///
/// # Errors
///
/// - [`CatalogError::Forbidden`] if the path escapes `root`, lexically or
///   through a symlink
/// - [`CatalogError::NotFound`] if nothing exists at the path
/// - [`CatalogError::InvalidRequest`] if the path is not a regular file
/// - [`CatalogError::Internal`] for other I/O failures
pub fn resolve_download(root: &Path, relative: &str) -> CatalogResult<ResolvedFile> {
    let forbidden = || CatalogError::Forbidden {
        path: relative.to_string(),
        root: root.display().to_string(),
    };

    let Some(candidate) = join_within(root, relative) else {
        warn!(path = relative, "Rejected path outside served directory");
        return Err(forbidden());
    };

    if !candidate.exists() {
        debug!(path = %candidate.display(), "Requested file does not exist");
        return Err(CatalogError::NotFound {
            path: relative.to_string(),
        });
    }

    let canonical_root = root
        .canonicalize()
        .map_err(|e| CatalogError::io("resolve", root, e))?;
    let canonical = candidate
        .canonicalize()
        .map_err(|e| CatalogError::io("resolve", &candidate, e))?;

    if !canonical.starts_with(&canonical_root) {
        warn!(
            path = relative,
            resolved = %canonical.display(),
            "Rejected symlink leaving served directory"
        );
        return Err(forbidden());
    }

    let metadata = fs::metadata(&canonical).map_err(|e| CatalogError::io("stat", &canonical, e))?;
    if !metadata.is_file() {
        return Err(CatalogError::InvalidRequest {
            path: relative.to_string(),
        });
    }

    let file_name = canonical
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(ResolvedFile {
        path: canonical,
        file_name,
        size: metadata.len(),
    })
}
