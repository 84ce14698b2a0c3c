//! Tests for Snapshots
//!
//! These tests verify:
//! - Writing and reading back a keyspace with every value type
//! - Header validation (magic, version, length)
//! - Checksum validation
//! - Atomic replacement of an existing snapshot

use std::fs;
use std::path::PathBuf;

use soundkv::keyspace::{Keyspace, Op};
use soundkv::storage::Snapshot;
use soundkv::SoundKvError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_snapshot() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("snapshot.skv");
    (temp_dir, path)
}

fn sample_keyspace() -> Keyspace {
    let mut ks = Keyspace::new();
    for op in [
        Op::Set { key: "sounds:id".to_string(), value: "2".to_string() },
        Op::SAdd { key: "sounds".to_string(), member: "1".to_string() },
        Op::SAdd { key: "sounds".to_string(), member: "2".to_string() },
        Op::HSet {
            key: "sounds:1".to_string(),
            field: "name".to_string(),
            value: "Airhorn".to_string(),
        },
        Op::HSet {
            key: "joinsounds".to_string(),
            field: "user-1".to_string(),
            value: "1".to_string(),
        },
    ] {
        ks.apply(&op).unwrap();
    }
    ks
}

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_write_then_read() {
    let (_temp, path) = setup_temp_snapshot();
    let keyspace = sample_keyspace();

    let size = Snapshot::write(&path, 17, &keyspace).unwrap();
    let snapshot = Snapshot::read(&path).unwrap();

    assert_eq!(size, fs::metadata(&path).unwrap().len());
    assert_eq!(snapshot.last_lsn, 17);
    assert_eq!(snapshot.keyspace, keyspace);
    assert_eq!(snapshot.keyspace.hget("sounds:1", "name").unwrap(), Some("Airhorn"));
}

#[test]
fn test_empty_keyspace() {
    let (_temp, path) = setup_temp_snapshot();

    Snapshot::write(&path, 0, &Keyspace::new()).unwrap();
    let snapshot = Snapshot::read(&path).unwrap();

    assert!(snapshot.keyspace.is_empty());
}

#[test]
fn test_overwrite_replaces_previous() {
    let (_temp, path) = setup_temp_snapshot();
    Snapshot::write(&path, 1, &Keyspace::new()).unwrap();

    Snapshot::write(&path, 9, &sample_keyspace()).unwrap();

    let snapshot = Snapshot::read(&path).unwrap();
    assert_eq!(snapshot.last_lsn, 9);
    assert_eq!(snapshot.keyspace.scard("sounds").unwrap(), 2);
    assert!(!path.with_extension("tmp").exists());
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_bad_magic() {
    let (_temp, path) = setup_temp_snapshot();
    Snapshot::write(&path, 1, &sample_keyspace()).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    bytes[0] = b'X';
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(Snapshot::read(&path), Err(SoundKvError::Storage(_))));
}

#[test]
fn test_unsupported_version() {
    let (_temp, path) = setup_temp_snapshot();
    Snapshot::write(&path, 1, &sample_keyspace()).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    bytes[4..6].copy_from_slice(&99u16.to_le_bytes());
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(Snapshot::read(&path), Err(SoundKvError::Storage(_))));
}

#[test]
fn test_checksum_mismatch() {
    let (_temp, path) = setup_temp_snapshot();
    Snapshot::write(&path, 1, &sample_keyspace()).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    let middle = bytes.len() / 2;
    bytes[middle] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    assert!(Snapshot::read(&path).is_err());
}

#[test]
fn test_truncated_file() {
    let (_temp, path) = setup_temp_snapshot();
    Snapshot::write(&path, 1, &sample_keyspace()).unwrap();

    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 2]).unwrap();

    assert!(matches!(Snapshot::read(&path), Err(SoundKvError::Storage(_))));
}
