//! Tests for WAL Writer
//!
//! These tests verify:
//! - Appending entries and LSN assignment
//! - Sync strategies
//! - Truncation after checkpoints
//! - Reading written entries back

use std::path::PathBuf;

use soundkv::config::WalSyncStrategy;
use soundkv::keyspace::Op;
use soundkv::wal::{WalReader, WalWriter};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

fn set_op(i: usize) -> Vec<Op> {
    vec![Op::Set { key: format!("key{}", i), value: format!("value{}", i) }]
}

// =============================================================================
// Append Tests
// =============================================================================

#[test]
fn test_write_single_entry() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();

    let lsn = writer.append(set_op(0)).unwrap();

    assert_eq!(lsn, 1);
    assert_eq!(writer.current_lsn(), 2);
    assert!(std::fs::metadata(&wal_path).unwrap().len() > 0);
}

#[test]
fn test_lsn_sequential() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();

    for expected in 1..=10u64 {
        assert_eq!(writer.append(set_op(expected as usize)).unwrap(), expected);
    }
}

#[test]
fn test_reopen_continues_lsn() {
    let (_temp, wal_path) = setup_temp_wal();
    {
        let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
        writer.append(set_op(1)).unwrap();
        writer.append(set_op(2)).unwrap();
    }

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    assert_eq!(writer.current_lsn(), 3);
    assert_eq!(writer.append(set_op(3)).unwrap(), 3);
}

#[test]
fn test_open_at_starts_from_given_lsn() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open_at(&wal_path, WalSyncStrategy::EveryWrite, 42).unwrap();

    assert_eq!(writer.append(set_op(0)).unwrap(), 42);
}

// =============================================================================
// Sync Strategy Tests
// =============================================================================

#[test]
fn test_sync_every_write() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();

    writer.append(set_op(0)).unwrap();
    assert_eq!(writer.unsynced_entries(), 0);
}

#[test]
fn test_sync_every_n_entries() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer =
        WalWriter::open(&wal_path, WalSyncStrategy::EveryNEntries { count: 3 }).unwrap();

    writer.append(set_op(0)).unwrap();
    writer.append(set_op(1)).unwrap();
    assert_eq!(writer.unsynced_entries(), 2);

    writer.append(set_op(2)).unwrap();
    assert_eq!(writer.unsynced_entries(), 0);
}

#[test]
fn test_manual_sync() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer =
        WalWriter::open(&wal_path, WalSyncStrategy::EveryNEntries { count: 100 }).unwrap();

    writer.append(set_op(0)).unwrap();
    assert_eq!(writer.unsynced_entries(), 1);

    writer.sync().unwrap();
    assert_eq!(writer.unsynced_entries(), 0);
}

// =============================================================================
// Read-back Tests
// =============================================================================

#[test]
fn test_write_then_read() {
    let (_temp, wal_path) = setup_temp_wal();
    {
        let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
        writer
            .append(vec![
                Op::SAdd { key: "sounds".to_string(), member: "1".to_string() },
                Op::Del { key: "stale".to_string() },
            ])
            .unwrap();
    }

    let mut reader = WalReader::open(&wal_path).unwrap();
    let entry = reader.next_entry().unwrap().unwrap();

    assert_eq!(entry.lsn, 1);
    assert_eq!(entry.ops.len(), 2);
    assert!(matches!(entry.ops[1], Op::Del { .. }));
    assert!(reader.next_entry().unwrap().is_none());
}

#[test]
fn test_write_read_many_entries() {
    let (_temp, wal_path) = setup_temp_wal();
    {
        let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
        for i in 0..50 {
            writer.append(set_op(i)).unwrap();
        }
    }

    let entries: Vec<_> = WalReader::open(&wal_path)
        .unwrap()
        .entries()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(entries.len(), 50);
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.lsn, i as u64 + 1);
        assert_eq!(entry.ops, set_op(i));
    }
}

// =============================================================================
// Truncate Tests
// =============================================================================

#[test]
fn test_truncate_clears_file_and_keeps_lsn() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();

    writer.append(set_op(0)).unwrap();
    writer.append(set_op(1)).unwrap();
    writer.truncate().unwrap();

    assert_eq!(std::fs::metadata(&wal_path).unwrap().len(), 0);
    assert_eq!(writer.current_lsn(), 3);
}

#[test]
fn test_truncate_then_write() {
    let (_temp, wal_path) = setup_temp_wal();
    {
        let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
        writer.append(set_op(0)).unwrap();
        writer.truncate().unwrap();
        writer.append(set_op(1)).unwrap();
    }

    let entries: Vec<_> = WalReader::open(&wal_path)
        .unwrap()
        .entries()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].lsn, 2);
    assert_eq!(entries[0].ops, set_op(1));
}
