//! Storage Module
//!
//! Persistent checkpoints of the whole keyspace.
//!
//! ## Responsibilities
//! - Persist the keyspace to disk as one self-validating file
//! - Record the last WAL LSN the checkpoint covers
//! - Replace the previous checkpoint atomically (write temp file, rename)
//!
//! ## File Format (V1)
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Header (22 bytes)                      │
//! │ ┌──────────┬──────────┬──────────────┐ │
//! │ │Magic (4) │Version(2)│ LastLSN (8)  │ │
//! │ ├──────────┴──────────┴──────────────┤ │
//! │ │ DataLen (8)                        │ │
//! │ └────────────────────────────────────┘ │
//! ├────────────────────────────────────────┤
//! │ Data Block: bincode(Keyspace)          │
//! ├────────────────────────────────────────┤
//! │ Footer: CRC32 of Data Block (4)        │
//! └────────────────────────────────────────┘
//! ```

mod snapshot;

pub use snapshot::Snapshot;

/// Magic bytes identifying a SoundKV snapshot file
pub(crate) const MAGIC: &[u8; 4] = b"SKVS";

/// Current snapshot format version
pub(crate) const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + LastLSN (8) + DataLen (8) = 22 bytes
pub(crate) const HEADER_SIZE: usize = 22;

/// Footer size: DataCRC (4)
pub(crate) const FOOTER_SIZE: usize = 4;
