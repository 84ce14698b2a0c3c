//! Snapshot reader/writer

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use bytes::{Buf, BufMut};

use crate::error::{Result, SoundKvError};
use crate::keyspace::Keyspace;

use super::{FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION};

/// A loaded checkpoint
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Highest WAL LSN already folded into `keyspace`
    pub last_lsn: u64,

    /// Keyspace contents at checkpoint time
    pub keyspace: Keyspace,
}

impl Snapshot {
    /// Write a snapshot of `keyspace` to `path`, returning the file size.
    ///
    /// The previous file at `path` stays intact until the new one is fully
    /// synced, then is replaced by rename.
    pub fn write(path: &Path, last_lsn: u64, keyspace: &Keyspace) -> Result<u64> {
        let data = bincode::serialize(keyspace)?;

        let mut header = Vec::with_capacity(HEADER_SIZE);
        header.put_slice(MAGIC);
        header.put_u16_le(VERSION);
        header.put_u64_le(last_lsn);
        header.put_u64_le(data.len() as u64);

        let tmp_path = path.with_extension("tmp");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;

        let mut writer = BufWriter::new(file);
        writer.write_all(&header)?;
        writer.write_all(&data)?;
        writer.write_all(&crc32fast::hash(&data).to_le_bytes())?;
        writer.flush()?;

        let file = writer.into_inner().map_err(|e| {
            SoundKvError::Storage(format!("Failed to flush snapshot: {}", e))
        })?;
        file.sync_all()?;
        let file_size = file.metadata()?.len();
        drop(file);

        fs::rename(&tmp_path, path)?;
        if let Some(dir) = path.parent() {
            // Persist the rename itself; not every platform allows opening a directory
            if let Ok(dir) = File::open(dir) {
                let _ = dir.sync_all();
            }
        }

        Ok(file_size)
    }

    /// Read and validate a snapshot
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;

        if bytes.len() < HEADER_SIZE + FOOTER_SIZE {
            return Err(SoundKvError::Storage(format!(
                "Snapshot too short: {} bytes",
                bytes.len()
            )));
        }

        let mut header = &bytes[..HEADER_SIZE];
        if &header[0..4] != MAGIC {
            return Err(SoundKvError::Storage(format!(
                "Invalid snapshot magic: expected SKVS, got {:?}",
                &header[0..4]
            )));
        }
        header.advance(4);

        let version = header.get_u16_le();
        if version != VERSION {
            return Err(SoundKvError::Storage(format!(
                "Unsupported snapshot version: {}",
                version
            )));
        }

        let last_lsn = header.get_u64_le();
        let data_len = header.get_u64_le() as usize;

        if bytes.len() != HEADER_SIZE + data_len + FOOTER_SIZE {
            return Err(SoundKvError::Storage(format!(
                "Snapshot length mismatch: header says {} data bytes, file has {}",
                data_len,
                bytes.len()
            )));
        }

        let data = &bytes[HEADER_SIZE..HEADER_SIZE + data_len];
        let mut footer = &bytes[HEADER_SIZE + data_len..];
        let expected_crc = footer.get_u32_le();
        if crc32fast::hash(data) != expected_crc {
            return Err(SoundKvError::Storage(
                "Snapshot checksum mismatch".to_string(),
            ));
        }

        let keyspace = bincode::deserialize(data)?;

        Ok(Self { last_lsn, keyspace })
    }
}
