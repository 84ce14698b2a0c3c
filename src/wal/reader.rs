//! WAL Reader
//!
//! Strict sequential reader: any damage is reported as an error. Use
//! `WalRecovery` to read past corrupted entries.

use std::fs;
use std::path::Path;

use crate::error::{Result, SoundKvError};

use super::entry::{decode_frame, Frame};
use super::WalEntry;

/// Reads entries from the WAL file
pub struct WalReader {
    data: Vec<u8>,
    position: usize,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_bytes(fs::read(path)?))
    }

    /// Read entries from an in-memory buffer
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }

    /// Read the next entry from the WAL
    ///
    /// Returns `Ok(None)` at a clean end of file.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        let remaining = &self.data[self.position..];
        if remaining.is_empty() {
            return Ok(None);
        }

        match decode_frame(remaining) {
            Frame::Entry { entry, len } => {
                self.position += len;
                Ok(Some(entry))
            }
            Frame::Corrupt { lsn, .. } => Err(SoundKvError::WalCorruption(format!(
                "CRC mismatch for entry lsn={} at offset {}",
                lsn, self.position
            ))),
            Frame::BadLength { lsn, len } => Err(SoundKvError::WalCorruption(format!(
                "entry lsn={} at offset {} declares invalid length {}",
                lsn, self.position, len
            ))),
            Frame::Incomplete => Err(SoundKvError::WalCorruption(format!(
                "partial entry at offset {} ({} trailing bytes)",
                self.position,
                remaining.len()
            ))),
        }
    }

    /// Byte offset of the next entry
    pub fn position(&self) -> usize {
        self.position
    }

    /// Iterate over all entries
    pub fn entries(self) -> WalIterator {
        WalIterator { reader: self, failed: false }
    }
}

/// Iterator over WAL entries; stops after the first error
pub struct WalIterator {
    reader: WalReader,
    failed: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
