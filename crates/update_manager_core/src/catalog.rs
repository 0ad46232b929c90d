//! Archive catalog.
//!
//! Builds the annotated listing of archived build artifacts: scans the
//! archive root, filters by extension, attaches file details and filename
//! metadata, and orders the result newest build first.
//!
//! The catalog is rebuilt from the live filesystem on every call; nothing is
//! cached between requests.

use std::{cmp::Ordering, fs, path::Path, time::SystemTime};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    config::CatalogConfig,
    errors::CatalogResult,
    metadata::{extract_metadata, has_extension, ReleaseType},
    scanner::{self, ScanEntry, ScanOptions},
};

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Marker returned by [`format_size`] for negative sizes.
pub const INVALID_SIZE: &str = "Invalid size";

/// Render a byte count with a 1024 base and two decimals, e.g. `1.50 KB`.
pub fn format_size(size_bytes: i64) -> String {
    if size_bytes < 0 {
        return INVALID_SIZE.to_string();
    }

    let mut size = size_bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", size, SIZE_UNITS[unit])
}

/// Options accepted by [`ArchiveCatalogBuilder::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    /// Attach size and timestamps to each item
    pub include_details: bool,

    /// Keep only files with this extension (case-insensitive, dot optional)
    pub filter_ext: Option<String>,

    /// Descend into subdirectories
    pub recursive: bool,

    /// Omit directory entries from the listing
    pub flat_structure: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            include_details: true,
            filter_ext: None,
            recursive: true,
            flat_structure: true,
        }
    }
}

/// One entry of the archive listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveItem {
    pub name: String,

    /// Path relative to the archive root, `/` separated
    pub relative_path: String,

    pub is_directory: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_dir_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_human: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_type: Option<ReleaseType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_date_formatted: Option<String>,

    /// Immediate children of a directory entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contained_count: Option<usize>,

    /// Why details for this entry could not be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ArchiveItem {
    fn from_entry(entry: &ScanEntry) -> Self {
        Self {
            name: entry.name(),
            relative_path: entry.relative_path_string(),
            is_directory: entry.is_directory,
            parent_dir_name: None,
            size: None,
            size_human: None,
            modified_at: None,
            created_at: None,
            version: None,
            release_type: None,
            build_date: None,
            build_date_formatted: None,
            contained_count: None,
            error: None,
        }
    }
}

/// Result of a catalog listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveCatalog {
    /// Archive root the listing was taken from
    pub directory: String,

    pub items: Vec<ArchiveItem>,

    /// Set when the walk stopped at the configured item limit
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

/// Builds archive listings for a configured root.
#[derive(Debug, Clone)]
pub struct ArchiveCatalogBuilder {
    config: CatalogConfig,
}

impl ArchiveCatalogBuilder {
    pub fn new(config: CatalogConfig) -> Self {
        Self { config }
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// List the archive.
    ///
    /// Per-entry failures are recorded on the affected [`ArchiveItem`]; only
    /// a failure to create or read the root itself is returned as an error.
    pub fn list(&self, options: &ListOptions) -> CatalogResult<ArchiveCatalog> {
        let root = &self.config.root;
        let scan_options = ScanOptions {
            recursive: options.recursive,
            flat_structure: options.flat_structure,
            max_depth: self.config.max_depth,
            max_items: self.config.max_items,
        };

        let filter_ext = options
            .filter_ext
            .as_deref()
            .map(|ext| ext.trim_start_matches('.'))
            .filter(|ext| !ext.is_empty());

        let mut scan = scanner::scan(root, scan_options).inspect_err(|e| {
            error!("Error listing archive files: {}", e);
        })?;

        let mut items = Vec::new();
        for entry in scan.by_ref() {
            let entry = entry.inspect_err(|e| error!("Error listing archive files: {}", e))?;

            if !entry.is_directory {
                if let Some(ext) = filter_ext {
                    if !has_extension(&entry.name(), ext) {
                        continue;
                    }
                }
            }

            let item = if let Some(reason) = &entry.error {
                self.unreadable_item(&entry, reason)
            } else if entry.is_directory {
                self.directory_item(&entry, options.include_details)
            } else {
                self.file_item(&entry, options.include_details)
            };
            items.push(item);
        }

        sort_items(&mut items);

        info!(
            root = %root.display(),
            count = items.len(),
            truncated = scan.truncated(),
            "Listed archive"
        );

        Ok(ArchiveCatalog {
            directory: root.display().to_string(),
            items,
            truncated: scan.truncated(),
        })
    }

    fn file_item(&self, entry: &ScanEntry, include_details: bool) -> ArchiveItem {
        let mut item = ArchiveItem::from_entry(entry);
        item.parent_dir_name = entry
            .absolute_path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned());

        if include_details {
            match fs::metadata(&entry.absolute_path) {
                Ok(meta) => {
                    item.size = Some(meta.len());
                    item.size_human = Some(format_size(meta.len() as i64));
                    item.modified_at = meta.modified().ok().map(to_utc);
                    item.created_at = meta.created().ok().map(to_utc);
                }
                Err(e) => {
                    error!(
                        path = %entry.absolute_path.display(),
                        "Error getting details: {}",
                        e
                    );
                    item.error = Some(format!("Failed to get details: {}", e));
                }
            }
        }

        self.apply_metadata(&mut item);
        item
    }

    fn apply_metadata(&self, item: &mut ArchiveItem) {
        let metadata = extract_metadata(&item.name, &self.config.artifact_extension);
        item.build_date_formatted = metadata.build_date_formatted();
        item.version = metadata.version;
        item.release_type = metadata.release_type;
        item.build_date = metadata.build_date;
    }

    /// Item for an entry the scanner found but could not read.
    fn unreadable_item(&self, entry: &ScanEntry, reason: &str) -> ArchiveItem {
        let mut item = ArchiveItem::from_entry(entry);
        item.error = Some(format!("Failed to get details: {}", reason));
        if !entry.is_directory {
            self.apply_metadata(&mut item);
        }
        item
    }

    fn directory_item(&self, entry: &ScanEntry, include_details: bool) -> ArchiveItem {
        let mut item = ArchiveItem::from_entry(entry);

        let details = directory_details(&entry.absolute_path, include_details);
        match details {
            Ok((modified_at, created_at, contained_count)) => {
                item.modified_at = modified_at;
                item.created_at = created_at;
                item.contained_count = Some(contained_count);
            }
            Err(e) => {
                error!(
                    path = %entry.absolute_path.display(),
                    "Error getting details: {}",
                    e
                );
                item.error = Some(format!("Failed to get details: {}", e));
            }
        }

        item
    }
}

type Timestamp = Option<DateTime<Utc>>;

fn directory_details(
    dir: &Path,
    include_details: bool,
) -> std::io::Result<(Timestamp, Timestamp, usize)> {
    let (modified_at, created_at) = if include_details {
        let meta = fs::metadata(dir)?;
        (meta.modified().ok().map(to_utc), meta.created().ok().map(to_utc))
    } else {
        (None, None)
    };
    Ok((modified_at, created_at, count_children(dir)?))
}

fn count_children(dir: &Path) -> std::io::Result<usize> {
    let mut count = 0;
    for child in fs::read_dir(dir)? {
        child?;
        count += 1;
    }
    Ok(count)
}

fn to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}

/// Epoch date used in place of a missing build date when ordering.
fn undated() -> NaiveDate {
    NaiveDate::default()
}

/// Newest build date first, then case-insensitive name.
pub fn compare_items(a: &ArchiveItem, b: &ArchiveItem) -> Ordering {
    let date_a = a.build_date.unwrap_or_else(undated);
    let date_b = b.build_date.unwrap_or_else(undated);

    date_b
        .cmp(&date_a)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
}

/// Sort items in catalog order. See [`compare_items`].
pub fn sort_items(items: &mut [ArchiveItem]) {
    items.sort_by(compare_items);
    debug!(count = items.len(), "Sorted archive items");
}
