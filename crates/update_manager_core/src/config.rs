//! Service configuration.
//!
//! All filesystem roots and script locations live in [`ManagerConfig`], which
//! is built once at startup and handed to the components that need it. The
//! configuration is stored in TOML format; every field has a default so a
//! partial file is valid.
//!
//! # Example TOML Configuration
//!
//! ```toml
//! [paths]
//! archive_dir = "/srv/stratus/.archive"
//!
//! [scripts]
//! build_script = "/srv/stratus/build_deb_package.sh"
//! build_timeout_secs = 600
//!
//! [catalog]
//! artifact_extension = "update"
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{ConfigError, ConfigResult};

/// Extension (without dot) of release artifacts that carry version metadata.
pub const DEFAULT_ARTIFACT_EXTENSION: &str = "update";

/// Default maximum directory depth visited by the catalog walk.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Default maximum number of entries visited by the catalog walk.
pub const DEFAULT_MAX_ITEMS: usize = 50_000;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Top level configuration for the update manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Filesystem locations for inputs, packages and artifacts
    pub paths: PathsConfig,

    /// External scripts invoked by the builder and pipeline endpoints
    pub scripts: ScriptsConfig,

    /// Archive catalog settings
    pub catalog: CatalogConfig,
}

impl ManagerConfig {
    /// Loads configuration from a TOML file at the specified path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileNotFound`] if the file does not exist,
    /// [`ConfigError::Read`] if it cannot be read and
    /// [`ConfigError::Parse`] if it is not valid TOML for this structure.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        debug!("Loading configuration from {:?}", path);

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }

    /// Builds the default layout with every relative location placed under
    /// `base`.
    pub fn from_base_dir(base: impl AsRef<Path>) -> Self {
        let mut config = Self::default();
        config.rebase(base.as_ref());
        config
    }

    /// Re-roots every relative path in the configuration under `base`.
    /// Absolute paths are left untouched.
    pub fn rebase(&mut self, base: &Path) {
        let paths = &mut self.paths;
        for path in [
            &mut paths.archive_dir,
            &mut paths.output_dir,
            &mut paths.debs_dir,
            &mut paths.serial_file,
            &mut paths.commands_json,
            &mut paths.uploads_dir,
        ] {
            rebase_path(path, base);
        }

        let scripts = &mut self.scripts;
        for path in [
            &mut scripts.build_script,
            &mut scripts.archive_script,
            &mut scripts.launcher_script,
        ] {
            rebase_path(path, base);
        }
    }
}

fn rebase_path(path: &mut PathBuf, base: &Path) {
    if path.is_relative() {
        *path = base.join(&*path);
    }
}

/// Filesystem locations used by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root of the archived build artifacts served by `/archives`
    pub archive_dir: PathBuf,

    /// Directory the build script writes its outputs to
    pub output_dir: PathBuf,

    /// Directory holding the Debian packages consumed by the build script
    pub debs_dir: PathBuf,

    /// File receiving the validated device serial number
    pub serial_file: PathBuf,

    /// File receiving the uploaded JSON command set
    pub commands_json: PathBuf,

    /// Files sent to `/upload` and served back by `/command`
    pub uploads_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            archive_dir: PathBuf::from(".archive"),
            output_dir: PathBuf::from("_output"),
            debs_dir: PathBuf::from("debs"),
            serial_file: PathBuf::from("commands/_output/serial_number.txt"),
            commands_json: PathBuf::from("commands/json/commands.json"),
            uploads_dir: PathBuf::from("uploads"),
        }
    }
}

/// External script locations and limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// Interpreter for shell scripts
    pub shell: String,

    /// Interpreter for the archive script
    pub python: String,

    /// Script producing the update package
    pub build_script: PathBuf,

    /// Script archiving a successful build
    pub archive_script: PathBuf,

    /// Entry point of the command pipeline
    pub launcher_script: PathBuf,

    /// Arguments passed to the launcher script
    pub launcher_args: Vec<String>,

    pub build_timeout_secs: u64,

    pub archive_timeout_secs: u64,
}

impl ScriptsConfig {
    pub fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_secs)
    }

    pub fn archive_timeout(&self) -> Duration {
        Duration::from_secs(self.archive_timeout_secs)
    }
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            shell: "bash".to_string(),
            python: "python".to_string(),
            build_script: PathBuf::from("build_deb_package.sh"),
            archive_script: PathBuf::from("scripts/archive.py"),
            launcher_script: PathBuf::from("commands/launcher.sh"),
            launcher_args: vec!["help".to_string()],
            build_timeout_secs: 300,
            archive_timeout_secs: 60,
        }
    }
}

/// Settings for the archive catalog walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Archive root. Filled from [`PathsConfig::archive_dir`] when built via
    /// [`ManagerConfig::catalog_config`].
    #[serde(skip)]
    pub root: PathBuf,

    /// Extension (without dot) of artifacts whose names carry metadata
    pub artifact_extension: String,

    /// Deepest directory level visited when listing recursively
    pub max_depth: usize,

    /// Upper bound on entries visited per listing
    pub max_items: usize,
}

impl CatalogConfig {
    /// Catalog configuration for `root` with default limits.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            artifact_extension: DEFAULT_ARTIFACT_EXTENSION.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_items: DEFAULT_MAX_ITEMS,
        }
    }
}

impl ManagerConfig {
    /// Catalog settings bound to the configured archive directory.
    pub fn catalog_config(&self) -> CatalogConfig {
        CatalogConfig {
            root: self.paths.archive_dir.clone(),
            ..self.catalog.clone()
        }
    }
}
