//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries and their framing.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SoundKvError};
use crate::keyspace::Op;

/// Frame header size: LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// Largest data section accepted when reading a frame (64 MB)
pub const MAX_ENTRY_SIZE: u32 = 64 * 1024 * 1024;

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// Every write of one committed batch or transaction
    pub ops: Vec<Op>,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Outcome of decoding one frame from a byte buffer
#[derive(Debug)]
pub(crate) enum Frame {
    /// A valid entry occupying `len` bytes
    Entry { entry: WalEntry, len: usize },

    /// Header readable, body damaged; the frame spans `len` bytes
    Corrupt { lsn: u64, len: usize },

    /// Length field outside the accepted range; the frame's extent is unknown
    BadLength { lsn: u64, len: u32 },

    /// Not enough bytes for a full frame (torn write at the tail)
    Incomplete,
}

impl WalEntry {
    pub fn new(lsn: u64, ops: Vec<Op>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self { lsn, ops, timestamp }
    }

    /// Encode as a complete frame (header + data)
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let data = bincode::serialize(self)?;
        if data.len() > MAX_ENTRY_SIZE as usize {
            return Err(SoundKvError::Storage(format!(
                "WAL entry too large: {} bytes (max {})",
                data.len(),
                MAX_ENTRY_SIZE
            )));
        }

        let mut frame = Vec::with_capacity(HEADER_SIZE + data.len());
        frame.put_u64_le(self.lsn);
        frame.put_u32_le(Self::compute_crc(&data));
        frame.put_u32_le(data.len() as u32);
        frame.extend_from_slice(&data);

        Ok(frame)
    }

    /// Decode a complete frame
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        match decode_frame(bytes) {
            Frame::Entry { entry, .. } => Ok(entry),
            Frame::Corrupt { lsn, .. } => Err(SoundKvError::WalCorruption(format!(
                "checksum or payload mismatch in entry lsn={}",
                lsn
            ))),
            Frame::BadLength { lsn, len } => Err(SoundKvError::WalCorruption(format!(
                "entry lsn={} declares {} data bytes (max {})",
                lsn, len, MAX_ENTRY_SIZE
            ))),
            Frame::Incomplete => Err(SoundKvError::WalCorruption(format!(
                "incomplete entry: {} bytes",
                bytes.len()
            ))),
        }
    }

    pub fn compute_crc(data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }
}

/// Decode the frame at the start of `bytes`
pub(crate) fn decode_frame(bytes: &[u8]) -> Frame {
    if bytes.len() < HEADER_SIZE {
        return Frame::Incomplete;
    }

    let mut header = &bytes[..HEADER_SIZE];
    let lsn = header.get_u64_le();
    let crc = header.get_u32_le();
    let data_len = header.get_u32_le();

    // A torn append leaves a prefix of a real header, so this is damage, not a tail
    if data_len > MAX_ENTRY_SIZE {
        return Frame::BadLength { lsn, len: data_len };
    }

    let len = HEADER_SIZE + data_len as usize;
    if bytes.len() < len {
        return Frame::Incomplete;
    }

    let data = &bytes[HEADER_SIZE..len];
    if WalEntry::compute_crc(data) != crc {
        return Frame::Corrupt { lsn, len };
    }

    match bincode::deserialize::<WalEntry>(data) {
        Ok(entry) if entry.lsn == lsn => Frame::Entry { entry, len },
        _ => Frame::Corrupt { lsn, len },
    }
}
