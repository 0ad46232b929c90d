//! Tests for build output listing.

use super::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_lists_root_and_one_level_of_subfolders() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::write(root.join("summary.log"), b"log").unwrap();
    fs::create_dir_all(root.join("commands_20250829/deeper")).unwrap();
    fs::write(root.join("commands_20250829/file1.update"), b"1").unwrap();
    fs::write(root.join("commands_20250829/deeper/hidden.update"), b"2").unwrap();

    let files = list_output_files(root).unwrap();

    assert_eq!(
        files,
        vec![
            "commands_20250829/file1.update".to_string(),
            "summary.log".to_string(),
        ]
    );
}

#[test]
fn test_missing_directory_is_created_and_empty() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("_output");

    let files = list_output_files(&root).unwrap();

    assert!(files.is_empty());
    assert!(root.is_dir());
}

#[cfg(unix)]
#[test]
fn test_unreadable_subfolder_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::write(root.join("summary.log"), b"log").unwrap();
    fs::create_dir_all(root.join("commands_20250829")).unwrap();
    fs::write(root.join("commands_20250829/file1.update"), b"1").unwrap();
    let locked = root.join("commands_20250829");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = list_output_files(root);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(result.unwrap(), vec!["summary.log".to_string()]);
}
