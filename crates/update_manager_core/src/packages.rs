//! File uploads.
//!
//! Uploaded `.deb` files, and `.deb` files found inside uploaded `.zip`
//! archives, are first staged in a temporary directory. Installing the staged
//! set replaces every package currently in the debs directory.
//!
//! Other uploads are stored as-is with [`save_upload`].

use std::{
    fs,
    io::{self, Cursor},
    path::{Path, PathBuf},
};

use tempfile::TempDir;
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::{
    errors::{PackageError, PackageResult},
    metadata::has_extension,
};

#[cfg(test)]
#[path = "packages_tests.rs"]
mod tests;

const DEB_EXTENSION: &str = "deb";
const ZIP_EXTENSION: &str = "zip";

/// A file received from an upload form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Name supplied by the client; may contain directory components
    pub file_name: String,

    pub contents: Vec<u8>,
}

/// Packages waiting to be installed. The staging directory is removed when
/// this value is dropped.
#[derive(Debug)]
pub struct StagedPackages {
    dir: TempDir,
    files: Vec<PathBuf>,
}

impl StagedPackages {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    fn stage(&mut self, name: &str, reader: &mut impl io::Read) -> PackageResult<()> {
        let target = self.dir.path().join(name);
        let mut file =
            fs::File::create(&target).map_err(|e| PackageError::io("create", &target, e))?;
        io::copy(reader, &mut file).map_err(|e| PackageError::io("write", &target, e))?;

        // A later upload with the same name replaces the earlier one.
        if !self.files.contains(&target) {
            self.files.push(target);
        }
        Ok(())
    }
}

/// Reduce a client supplied file name to its base name.
pub fn sanitize_file_name(name: &str) -> PackageResult<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();

    if base.is_empty() || base == "." || base == ".." {
        return Err(PackageError::InvalidFileName {
            name: name.to_string(),
        });
    }
    Ok(base.to_string())
}

/// Store `upload` in `dir` under its base name, replacing any file with the
/// same name. Returns the written path.
pub fn save_upload(dir: &Path, upload: &UploadedFile) -> PackageResult<PathBuf> {
    let name = sanitize_file_name(&upload.file_name)?;
    fs::create_dir_all(dir).map_err(|e| PackageError::io("create", dir, e))?;

    let target = dir.join(name);
    fs::write(&target, &upload.contents).map_err(|e| PackageError::io("write", &target, e))?;

    info!(path = %target.display(), bytes = upload.contents.len(), "Saved uploaded file");
    Ok(target)
}

/// Stage every Debian package contained in `uploads`.
///
/// `.deb` uploads are staged as-is; `.zip` uploads are searched at any depth
/// for `.deb` entries. Other files are skipped.
pub fn stage_uploads(uploads: &[UploadedFile]) -> PackageResult<StagedPackages> {
    let dir = TempDir::new().map_err(|e| PackageError::io("create", std::env::temp_dir(), e))?;
    let mut staged = StagedPackages {
        dir,
        files: Vec::new(),
    };

    for upload in uploads {
        let name = sanitize_file_name(&upload.file_name)?;

        if has_extension(&name, ZIP_EXTENSION) {
            info!(file = %name, "Extracting packages from zip");
            extract_debs(&name, &upload.contents, &mut staged)?;
        } else if has_extension(&name, DEB_EXTENSION) {
            debug!(file = %name, bytes = upload.contents.len(), "Staging package");
            staged.stage(&name, &mut upload.contents.as_slice())?;
        } else {
            warn!(file = %name, "Skipping unsupported file");
        }
    }

    Ok(staged)
}

fn extract_debs(zip_name: &str, contents: &[u8], staged: &mut StagedPackages) -> PackageResult<()> {
    let zip_error = |e: zip::result::ZipError| PackageError::Zip {
        name: zip_name.to_string(),
        reason: e.to_string(),
    };

    let mut archive = ZipArchive::new(Cursor::new(contents)).map_err(zip_error)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(zip_error)?;
        if entry.is_dir() {
            continue;
        }

        let Some(name) = entry
            .enclosed_name()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
        else {
            warn!(archive = zip_name, entry = entry.name(), "Skipping unsafe zip entry");
            continue;
        };

        if has_extension(&name, DEB_EXTENSION) {
            debug!(archive = zip_name, file = %name, "Found package in zip");
            staged.stage(&name, &mut entry)?;
        }
    }

    Ok(())
}

/// Replace the packages in `debs_dir` with the staged set.
///
/// Returns the installed file names in staging order.
pub fn install_debs(debs_dir: &Path, staged: &StagedPackages) -> PackageResult<Vec<String>> {
    fs::create_dir_all(debs_dir).map_err(|e| PackageError::io("create", debs_dir, e))?;

    let removed = clear_debs(debs_dir)?;
    debug!(dir = %debs_dir.display(), removed, "Cleared existing packages");

    let mut installed = Vec::with_capacity(staged.len());
    for (index, source) in staged.files().iter().enumerate() {
        let Some(name) = source.file_name() else {
            continue;
        };
        let target = debs_dir.join(name);
        info!(
            "[{}/{}] Moving {} -> {}",
            index + 1,
            staged.len(),
            source.display(),
            target.display()
        );
        move_file(source, &target)?;
        installed.push(name.to_string_lossy().into_owned());
    }

    info!(dir = %debs_dir.display(), count = installed.len(), "Installed packages");
    Ok(installed)
}

/// Delete every `.deb` file directly inside `dir`. Returns how many were
/// removed.
pub fn clear_debs(dir: &Path) -> PackageResult<usize> {
    let entries = fs::read_dir(dir).map_err(|e| PackageError::io("read", dir, e))?;

    let mut removed = 0;
    for entry in entries {
        let path = entry.map_err(|e| PackageError::io("read", dir, e))?.path();
        let is_deb = path
            .file_name()
            .is_some_and(|n| has_extension(&n.to_string_lossy(), DEB_EXTENSION));
        if is_deb && path.is_file() {
            debug!(path = %path.display(), "Deleting package");
            fs::remove_file(&path).map_err(|e| PackageError::io("delete", &path, e))?;
            removed += 1;
        }
    }
    Ok(removed)
}

fn move_file(source: &Path, target: &Path) -> PackageResult<()> {
    if fs::rename(source, target).is_ok() {
        return Ok(());
    }

    // Staging may live on another filesystem.
    fs::copy(source, target).map_err(|e| PackageError::io("copy", target, e))?;
    fs::remove_file(source).map_err(|e| PackageError::io("delete", source, e))
}
