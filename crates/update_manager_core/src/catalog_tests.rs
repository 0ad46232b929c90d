//! Tests for the archive catalog.

use super::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn builder(root: &Path) -> ArchiveCatalogBuilder {
    ArchiveCatalogBuilder::new(CatalogConfig::new(root))
}

fn write(root: &Path, relative: &str, contents: &[u8]) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn names(catalog: &ArchiveCatalog) -> Vec<&str> {
    catalog.items.iter().map(|i| i.name.as_str()).collect()
}

fn item(name: &str, build_date: Option<(i32, u32, u32)>) -> ArchiveItem {
    ArchiveItem {
        name: name.to_string(),
        relative_path: name.to_string(),
        is_directory: false,
        parent_dir_name: None,
        size: None,
        size_human: None,
        modified_at: None,
        created_at: None,
        version: None,
        release_type: None,
        build_date: build_date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        build_date_formatted: None,
        contained_count: None,
        error: None,
    }
}

// ============================================================================
// format_size
// ============================================================================

#[test]
fn test_format_size() {
    assert_eq!(format_size(0), "0.00 B");
    assert_eq!(format_size(1023), "1023.00 B");
    assert_eq!(format_size(1536), "1.50 KB");
    assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
    assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    assert_eq!(format_size(2048 * 1024 * 1024 * 1024 * 1024), "2048.00 TB");
}

#[test]
fn test_format_size_negative_is_invalid() {
    assert_eq!(format_size(-1), INVALID_SIZE);
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn test_sort_newest_first_then_name() {
    let mut items = vec![
        item("undated-b.update", None),
        item("old.update", Some((2024, 1, 1))),
        item("Zeta.update", Some((2025, 8, 6))),
        item("alpha.update", Some((2025, 8, 6))),
        item("Undated-A.update", None),
    ];

    sort_items(&mut items);

    let ordered: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(
        ordered,
        vec![
            "alpha.update",
            "Zeta.update",
            "old.update",
            "Undated-A.update",
            "undated-b.update",
        ]
    );
}

#[test]
fn test_compare_items_is_total() {
    let dated = item("a", Some((2025, 1, 1)));
    let undated = item("a", None);

    assert_eq!(compare_items(&dated, &undated), Ordering::Less);
    assert_eq!(compare_items(&undated, &dated), Ordering::Greater);
    assert_eq!(compare_items(&dated, &dated), Ordering::Equal);
}

// ============================================================================
// Listing
// ============================================================================

#[test]
fn test_list_creates_missing_root() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join(".archive");

    let catalog = builder(&root).list(&ListOptions::default()).unwrap();

    assert!(root.is_dir());
    assert!(catalog.items.is_empty());
    assert_eq!(catalog.directory, root.display().to_string());
    assert!(!catalog.truncated);
}

#[test]
fn test_list_annotates_and_orders_artifacts() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "2025-08/Stratus_V0.1.38D_20250806.update", b"dev build");
    write(root, "2025-01/Stratus_V1.2.3_20250101.update", b"public");
    write(root, "notes.txt", b"hello");

    let catalog = builder(root).list(&ListOptions::default()).unwrap();

    assert_eq!(
        names(&catalog),
        vec![
            "Stratus_V0.1.38D_20250806.update",
            "Stratus_V1.2.3_20250101.update",
            "notes.txt",
        ]
    );

    let newest = &catalog.items[0];
    assert_eq!(newest.relative_path, "2025-08/Stratus_V0.1.38D_20250806.update");
    assert_eq!(newest.parent_dir_name.as_deref(), Some("2025-08"));
    assert_eq!(newest.version.as_deref(), Some("0.1.38D"));
    assert_eq!(newest.release_type, Some(ReleaseType::Development));
    assert_eq!(newest.build_date, NaiveDate::from_ymd_opt(2025, 8, 6));
    assert_eq!(newest.build_date_formatted.as_deref(), Some("Aug 06, 2025"));
    assert_eq!(newest.size, Some(9));
    assert_eq!(newest.size_human.as_deref(), Some("9.00 B"));
    assert!(newest.modified_at.is_some());
    assert!(newest.error.is_none());

    assert_eq!(catalog.items[1].release_type, Some(ReleaseType::Public));

    let notes = &catalog.items[2];
    assert!(notes.version.is_none());
    assert!(notes.build_date.is_none());
}

#[test]
fn test_list_without_details() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.update", b"abc");

    let options = ListOptions {
        include_details: false,
        ..ListOptions::default()
    };
    let catalog = builder(dir.path()).list(&options).unwrap();

    let entry = &catalog.items[0];
    assert!(entry.size.is_none());
    assert!(entry.size_human.is_none());
    assert!(entry.modified_at.is_none());
    assert!(entry.created_at.is_none());
}

#[test]
fn test_filter_extension_drops_non_matching_files() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "a.update", b"a");
    write(root, "b.UPDATE", b"b");
    write(root, "c.deb", b"c");
    write(root, "d.update.bak", b"d");

    for filter in ["update", ".update", "UPDATE"] {
        let options = ListOptions {
            filter_ext: Some(filter.to_string()),
            ..ListOptions::default()
        };
        let catalog = builder(root).list(&options).unwrap();

        assert_eq!(names(&catalog), vec!["a.update", "b.UPDATE"]);
        assert!(catalog.items.iter().all(|i| i.error.is_none()));
    }
}

#[test]
fn test_structured_listing_includes_directories() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "builds/one.update", b"1");
    write(root, "builds/two.update", b"2");
    fs::create_dir_all(root.join("builds/empty")).unwrap();

    let options = ListOptions {
        flat_structure: false,
        ..ListOptions::default()
    };
    let catalog = builder(root).list(&options).unwrap();

    let builds = catalog
        .items
        .iter()
        .find(|i| i.relative_path == "builds")
        .expect("directory entry present");
    assert!(builds.is_directory);
    assert_eq!(builds.contained_count, Some(3));
    assert!(builds.parent_dir_name.is_none());

    let empty = catalog
        .items
        .iter()
        .find(|i| i.relative_path == "builds/empty")
        .expect("nested directory entry present");
    assert_eq!(empty.contained_count, Some(0));
}

#[test]
fn test_filter_keeps_directories_in_structured_mode() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "builds/one.deb", b"1");

    let options = ListOptions {
        flat_structure: false,
        filter_ext: Some("update".to_string()),
        ..ListOptions::default()
    };
    let catalog = builder(dir.path()).list(&options).unwrap();

    assert_eq!(names(&catalog), vec!["builds"]);
}

#[test]
fn test_non_recursive_listing() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "top.update", b"1");
    write(dir.path(), "nested/deep.update", b"2");

    let options = ListOptions {
        recursive: false,
        ..ListOptions::default()
    };
    let catalog = builder(dir.path()).list(&options).unwrap();

    assert_eq!(names(&catalog), vec!["top.update"]);
}

#[test]
fn test_relative_paths_resolve_under_root() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "a/b/c/Stratus_V1.0.0_20250101.update", b"1");
    write(root, "a/x.update", b"2");
    write(root, "y.update", b"3");

    let options = ListOptions {
        flat_structure: false,
        ..ListOptions::default()
    };
    let catalog = builder(root).list(&options).unwrap();

    let canonical_root = root.canonicalize().unwrap();
    for entry in &catalog.items {
        let joined: PathBuf = entry
            .relative_path
            .split('/')
            .fold(root.to_path_buf(), |path, part| path.join(part));
        let resolved = joined.canonicalize().unwrap();
        assert!(resolved.starts_with(&canonical_root), "{}", entry.relative_path);
    }
}

#[test]
fn test_item_limit_marks_truncated() {
    let dir = TempDir::new().unwrap();
    for i in 0..5 {
        write(dir.path(), &format!("{i}.update"), b"x");
    }

    let mut config = CatalogConfig::new(dir.path());
    config.max_items = 3;
    let catalog = ArchiveCatalogBuilder::new(config)
        .list(&ListOptions::default())
        .unwrap();

    assert_eq!(catalog.items.len(), 3);
    assert!(catalog.truncated);
}

#[test]
fn test_custom_artifact_extension() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Stratus_V1.0.0_20250101.pkg", b"x");

    let mut config = CatalogConfig::new(dir.path());
    config.artifact_extension = "pkg".to_string();
    let catalog = ArchiveCatalogBuilder::new(config)
        .list(&ListOptions::default())
        .unwrap();

    assert_eq!(catalog.items[0].version.as_deref(), Some("1.0.0"));
}

#[test]
fn test_list_fails_when_root_is_a_file() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("not-a-dir");
    fs::write(&root, b"x").unwrap();

    let result = builder(&root).list(&ListOptions::default());

    assert!(matches!(result, Err(crate::errors::CatalogError::Internal { .. })));
}

// ============================================================================
// Per-item errors
// ============================================================================

#[test]
fn test_file_stat_failure_is_recorded_on_item() {
    let dir = TempDir::new().unwrap();
    let entry = ScanEntry {
        absolute_path: dir.path().join("vanished/Stratus_V1.0.0_20250101.update"),
        relative_path: PathBuf::from("vanished/Stratus_V1.0.0_20250101.update"),
        is_directory: false,
        error: None,
    };

    let item = builder(dir.path()).file_item(&entry, true);

    assert!(item.error.as_deref().unwrap().starts_with("Failed to get details"));
    assert!(item.size.is_none());
    // Name-derived metadata does not depend on the filesystem.
    assert_eq!(item.version.as_deref(), Some("1.0.0"));
}

#[test]
fn test_directory_failure_is_recorded_on_item() {
    let dir = TempDir::new().unwrap();
    let entry = ScanEntry {
        absolute_path: dir.path().join("vanished"),
        relative_path: PathBuf::from("vanished"),
        is_directory: true,
        error: None,
    };

    let item = builder(dir.path()).directory_item(&entry, false);

    assert!(item.error.is_some());
    assert!(item.contained_count.is_none());
}

#[cfg(unix)]
#[test]
fn test_unreadable_subdirectory_is_listed_with_error_in_flat_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    write(dir.path(), "top.update", b"x");
    write(dir.path(), "locked/inner_V1.0.0_20250101.update", b"x");
    let locked = dir.path().join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users (root, CAP_DAC_READ_SEARCH) can still read it.
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = builder(dir.path()).list(&ListOptions::default());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    let catalog = result.unwrap();

    assert_eq!(names(&catalog), vec!["locked", "top.update"]);
    let locked_item = &catalog.items[0];
    assert!(locked_item.is_directory);
    assert_eq!(locked_item.relative_path, "locked");
    assert!(locked_item
        .error
        .as_deref()
        .unwrap()
        .starts_with("Failed to get details: "));
    assert!(catalog.items[1].error.is_none());
}

#[cfg(unix)]
#[test]
fn test_unreadable_subdirectory_is_reported_once_in_structured_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    write(dir.path(), "locked/inner.update", b"x");
    let locked = dir.path().join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let options = ListOptions {
        flat_structure: false,
        ..ListOptions::default()
    };
    let result = builder(dir.path()).list(&options);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    let catalog = result.unwrap();

    assert_eq!(names(&catalog), vec!["locked"]);
    assert!(catalog.items[0].error.is_some());
}

#[test]
fn test_catalog_serializes_camel_case() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Stratus_V0.1.38D_20250806.update", b"x");

    let catalog = builder(dir.path()).list(&ListOptions::default()).unwrap();
    let json = serde_json::to_value(&catalog).unwrap();

    let first = &json["items"][0];
    assert_eq!(first["relativePath"], "Stratus_V0.1.38D_20250806.update");
    assert_eq!(first["isDirectory"], false);
    assert_eq!(first["releaseType"], "development");
    assert_eq!(first["buildDate"], "2025-08-06");
    assert_eq!(first["buildDateFormatted"], "Aug 06, 2025");
    assert_eq!(first["sizeHuman"], "1.00 B");
    assert!(first.get("error").is_none());
    assert!(json.get("truncated").is_none());
}
