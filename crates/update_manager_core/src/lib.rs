//! # Update Manager Core
//!
//! Filesystem side of the Stratus remote update manager: the archive catalog
//! of built update packages, safe download resolution, operator inputs,
//! Debian package uploads and the external build scripts.
//!
//! ## Overview
//!
//! - [`catalog`] lists the archive: scan, filter, annotate with filename
//!   metadata and order newest build first
//! - [`scanner`] walks a directory tree iteratively
//! - [`metadata`] extracts version, release type and build date from
//!   artifact names
//! - [`paths`] resolves client supplied paths without leaving a root
//! - [`inputs`], [`packages`], [`outputs`] and [`scripts`] back the builder
//!   and pipeline endpoints
//!
//! Nothing here knows about HTTP. The API crate maps the error types in
//! [`errors`] onto status codes.
//!
//! ## Examples
//!
//! ```no_run
//! use update_manager_core::{ArchiveCatalogBuilder, ListOptions, ManagerConfig};
//!
//! let config = ManagerConfig::from_base_dir("/srv/stratus");
//! let catalog = ArchiveCatalogBuilder::new(config.catalog_config())
//!     .list(&ListOptions::default())
//!     .expect("archive root should be readable");
//!
//! for item in &catalog.items {
//!     println!("{} {:?}", item.relative_path, item.build_date);
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod errors;
pub mod inputs;
pub mod metadata;
pub mod outputs;
pub mod packages;
pub mod paths;
pub mod scanner;
pub mod scripts;

// Re-export commonly used types
pub use catalog::{format_size, ArchiveCatalog, ArchiveCatalogBuilder, ArchiveItem, ListOptions};
pub use config::{CatalogConfig, ManagerConfig, PathsConfig, ScriptsConfig};
pub use errors::{
    CatalogError, CatalogResult, ConfigError, ConfigResult, InputError, InputResult,
    PackageError, PackageResult, ScriptError, ScriptResult,
};
pub use metadata::{extract_metadata, ArtifactMetadata, ReleaseType};
pub use paths::{resolve_download, ResolvedFile};
pub use scripts::{BuildPipeline, ScriptInvocation, ScriptOutput, ScriptRunner, ShellScriptRunner};
