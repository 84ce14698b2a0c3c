//! WAL Recovery
//!
//! Handles crash recovery by replaying the WAL.
//!
//! Every entry is one committed transaction, so recovery only ever yields a
//! prefix of the log. Damage at the very end is an interrupted append and is
//! cut off; damage with more data behind it means committed entries would be
//! lost, and recovery refuses to go on.

use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::error::{Result, SoundKvError};

use super::entry::{decode_frame, Frame};
use super::WalEntry;

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of damaged entries found (at most one: scanning stops there)
    pub entries_corrupted: u64,

    /// Last valid LSN
    pub last_lsn: u64,

    /// Whether the WAL ends in a partial or damaged final write. `recover`
    /// truncates it; `verify` only reports it.
    pub was_truncated: bool,

    /// Offset of damage followed by further data, if any. `recover` fails
    /// on such a log instead of dropping the entries after it.
    pub corrupt_offset: Option<u64>,
}

impl RecoveryResult {
    /// True when the log can be replayed as-is or after trimming its tail
    pub fn is_recoverable(&self) -> bool {
        self.corrupt_offset.is_none()
    }
}

impl WalRecovery {
    /// Recover entries from a WAL file
    ///
    /// This will:
    /// 1. Read valid entries up to the first damaged or partial frame
    /// 2. Truncate that frame if it is the last thing in the file
    /// 3. Fail with `WalCorruption` if anything follows it
    /// 4. Return all valid entries in order
    pub fn recover(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let data = fs::read(path)?;
        let (entries, result, valid_len) = Self::scan(&data);

        if let Some(offset) = result.corrupt_offset {
            return Err(SoundKvError::WalCorruption(format!(
                "{}: damaged entry at offset {} is followed by {} more bytes; \
                 refusing to discard committed entries",
                path.display(),
                offset,
                data.len() - valid_len
            )));
        }

        if result.was_truncated {
            tracing::warn!(
                "Truncating partial WAL tail in {}: {} -> {} bytes",
                path.display(),
                data.len(),
                valid_len
            );
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(valid_len as u64)?;
            file.sync_all()?;
        }

        Ok((entries, result))
    }

    /// Verify integrity of a WAL file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let data = fs::read(path)?;
        let (_, result, _) = Self::scan(&data);
        Ok(result)
    }

    /// Walk the buffer, returning valid entries, stats and the length of the
    /// well-formed prefix
    fn scan(data: &[u8]) -> (Vec<WalEntry>, RecoveryResult, usize) {
        let mut entries = Vec::new();
        let mut result = RecoveryResult::default();
        let mut offset = 0;

        while offset < data.len() {
            match decode_frame(&data[offset..]) {
                Frame::Entry { entry, len } => {
                    result.entries_recovered += 1;
                    result.last_lsn = result.last_lsn.max(entry.lsn);
                    entries.push(entry);
                    offset += len;
                }
                Frame::Corrupt { lsn, len } => {
                    result.entries_corrupted += 1;
                    if offset + len == data.len() {
                        tracing::warn!("Damaged final WAL entry lsn={} at offset {}", lsn, offset);
                        result.was_truncated = true;
                    } else {
                        tracing::warn!("Damaged WAL entry lsn={} at offset {}", lsn, offset);
                        result.corrupt_offset = Some(offset as u64);
                    }
                    break;
                }
                Frame::BadLength { lsn, len } => {
                    tracing::warn!(
                        "WAL entry lsn={} at offset {} has invalid length {}",
                        lsn,
                        offset,
                        len
                    );
                    result.entries_corrupted += 1;
                    result.corrupt_offset = Some(offset as u64);
                    break;
                }
                Frame::Incomplete => {
                    result.was_truncated = true;
                    break;
                }
            }
        }

        (entries, result, offset)
    }
}
