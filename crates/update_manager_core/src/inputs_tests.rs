//! Tests for operator input handling.

use super::*;
use tempfile::TempDir;

fn serials(first: &str, second: &str) -> SerialNumbers {
    SerialNumbers {
        serial1: first.to_string(),
        serial2: second.to_string(),
    }
}

#[test]
fn test_matching_serials_are_trimmed() {
    assert_eq!(
        serials("  SN-0042 ", "SN-0042").validate().unwrap(),
        "SN-0042"
    );
}

#[test]
fn test_mismatched_serials() {
    assert!(matches!(
        serials("SN-0042", "SN-0043").validate(),
        Err(InputError::SerialNumberMismatch)
    ));
}

#[test]
fn test_blank_serial() {
    assert!(matches!(
        serials("   ", "   ").validate(),
        Err(InputError::EmptySerialNumber)
    ));
    assert!(matches!(
        serials("SN-1", "").validate(),
        Err(InputError::EmptySerialNumber)
    ));
}

#[test]
fn test_save_serial_number_creates_parents() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("commands/_output/serial_number.txt");

    save_serial_number(&path, "SN-0042").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "SN-0042\n");
}

#[test]
fn test_save_commands_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("json/commands.json");
    let body = br#"{"commands": [{"name": "reboot"}]}"#;

    save_commands_json(&path, body).unwrap();

    assert_eq!(fs::read(&path).unwrap(), body);
}

#[test]
fn test_save_commands_json_rejects_invalid_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("commands.json");

    let result = save_commands_json(&path, b"{not json");

    assert!(matches!(result, Err(InputError::InvalidJson { .. })));
    assert!(!path.exists());
}

#[test]
fn test_write_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("file");
    fs::write(&blocker, b"x").unwrap();

    let result = save_serial_number(&blocker.join("serial.txt"), "SN-1");

    assert!(matches!(result, Err(InputError::Write { .. })));
}
