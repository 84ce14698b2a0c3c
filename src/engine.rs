//! Engine Module
//!
//! The embedded backing store that coordinates all components.
//!
//! ## Responsibilities
//! - Own the keyspace and serialize writers
//! - Run batches and transactions as all-or-nothing units
//! - Log every committed unit to the WAL before acknowledging it
//! - Recover from snapshot + WAL on startup, checkpoint on demand
//! - Host the pub/sub broker

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use fs2::FileExt;
use parking_lot::{Mutex, RwLock};

use crate::config::Config;
use crate::error::{Result, SoundKvError};
use crate::keyspace::{Batch, Keyspace, Op, Txn};
use crate::pubsub::{Broker, Subscriber};
use crate::storage::Snapshot;
use crate::wal::{WalRecovery, WalWriter};

/// The backing store
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (`eval`/`exec`): hold the keyspace write lock for the whole
///   composite operation, then append one WAL entry
///   - Lock order: keyspace → WAL
///   - A failing closure or WAL append rolls every write back
///
/// - **Reads** (`read`): hold the keyspace read lock for the whole closure,
///   so a multi-key read sees one consistent state
///
/// - **Pub/Sub**: independent of the keyspace lock entirely
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// All records (single lock = transaction boundary)
    keyspace: RwLock<Keyspace>,

    /// Write-ahead log; `None` for an in-memory store
    wal: Mutex<Option<WalWriter>>,

    /// Pub/sub hub
    broker: Broker,

    /// Exclusive lock on the data directory, released on drop
    _dir_lock: Option<File>,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";
    const SNAPSHOT_FILENAME: &'static str = "snapshot.skv";
    const LOCK_FILENAME: &'static str = "LOCK";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Open/create data directory and lock it
    /// 2. Load the last snapshot if there is one
    /// 3. Replay WAL entries newer than the snapshot
    /// 4. Checkpoint if anything was replayed
    pub fn open(config: Config) -> Result<Self> {
        let Some(data_dir) = config.data_dir.clone() else {
            tracing::debug!("Opening in-memory engine");
            return Ok(Self::with_parts(config, Keyspace::new(), None, None));
        };

        // Step 1: Create data directory if it doesn't exist; one engine per directory
        fs::create_dir_all(&data_dir)?;
        let dir_lock = Self::lock_dir(&data_dir)?;
        let snapshot_path = data_dir.join(Self::SNAPSHOT_FILENAME);
        let wal_path = data_dir.join(Self::WAL_FILENAME);

        // Step 2: Load snapshot
        let (mut keyspace, snapshot_lsn) = if snapshot_path.exists() {
            let snapshot = Snapshot::read(&snapshot_path)?;
            tracing::info!(
                "Loaded snapshot: {} keys, last_lsn={}",
                snapshot.keyspace.len(),
                snapshot.last_lsn
            );
            (snapshot.keyspace, snapshot.last_lsn)
        } else {
            (Keyspace::new(), 0)
        };

        // Step 3: Replay WAL
        let mut last_lsn = snapshot_lsn;
        let mut replayed = 0u64;
        if wal_path.exists() {
            let (entries, recovery_result) = WalRecovery::recover(&wal_path)?;

            if recovery_result.entries_recovered > 0 || recovery_result.entries_corrupted > 0 {
                tracing::info!(
                    "WAL recovery: {} entries recovered, {} corrupted, last_lsn={}",
                    recovery_result.entries_recovered,
                    recovery_result.entries_corrupted,
                    recovery_result.last_lsn
                );
            }

            for entry in entries {
                if entry.lsn <= snapshot_lsn {
                    continue;
                }
                for op in &entry.ops {
                    keyspace.apply(op).map_err(|e| {
                        SoundKvError::WalCorruption(format!(
                            "replay of entry lsn={} failed: {}",
                            entry.lsn, e
                        ))
                    })?;
                }
                replayed += 1;
            }
            last_lsn = last_lsn.max(recovery_result.last_lsn);
        }

        // Step 4: Make replayed data durable in a snapshot, then start a fresh log
        let mut wal = WalWriter::open_at(&wal_path, config.wal_sync_strategy, last_lsn + 1)?;
        if replayed > 0 {
            tracing::info!("Checkpointing {} replayed WAL entries", replayed);
            Snapshot::write(&snapshot_path, last_lsn, &keyspace)?;
            wal.truncate()?;
        }

        Ok(Self::with_parts(config, keyspace, Some(wal), Some(dir_lock)))
    }

    /// Take the directory's `LOCK` file, failing if another engine holds it
    fn lock_dir(data_dir: &Path) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(data_dir.join(Self::LOCK_FILENAME))?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(file),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                Err(SoundKvError::Locked(data_dir.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// A store that lives only in memory
    pub fn in_memory() -> Self {
        Self::with_parts(Config::in_memory(), Keyspace::new(), None, None)
    }

    fn with_parts(
        config: Config,
        keyspace: Keyspace,
        wal: Option<WalWriter>,
        dir_lock: Option<File>,
    ) -> Self {
        Self {
            config,
            keyspace: RwLock::new(keyspace),
            wal: Mutex::new(wal),
            broker: Broker::new(),
            _dir_lock: dir_lock,
        }
    }

    // =========================================================================
    // Reads and writes
    // =========================================================================

    /// Run a read-only closure against one consistent view of the keyspace
    pub fn read<R>(&self, f: impl FnOnce(&Keyspace) -> Result<R>) -> Result<R> {
        let keyspace = self.keyspace.read();
        f(&keyspace)
    }

    /// Evaluate a transaction
    ///
    /// The closure runs with exclusive access. If it returns `Err`, or the
    /// WAL append fails, every write it made is undone before returning.
    pub fn eval<R>(&self, f: impl FnOnce(&mut Txn<'_>) -> Result<R>) -> Result<R> {
        let mut keyspace = self.keyspace.write();
        let mut txn = Txn::new(&mut *keyspace);

        let value = match f(&mut txn) {
            Ok(value) => value,
            Err(e) => {
                txn.rollback();
                return Err(e);
            }
        };

        let (ops, undo) = txn.into_parts();
        if let Err(e) = self.log(ops) {
            tracing::warn!("WAL append failed, rolling back: {}", e);
            for entry in undo.into_iter().rev() {
                keyspace.revert(entry);
            }
            return Err(e);
        }

        Ok(value)
    }

    /// Commit a batch atomically, returning each op's integer reply
    pub fn exec(&self, batch: Batch) -> Result<Vec<i64>> {
        self.eval(|tx| batch.into_ops().into_iter().map(|op| tx.apply(op)).collect())
    }

    /// Atomically increment the integer at `key`
    pub fn incr(&self, key: &str) -> Result<i64> {
        self.eval(|tx| tx.incr(key))
    }

    fn log(&self, ops: Vec<Op>) -> Result<()> {
        if ops.is_empty() {
            return Ok(());
        }
        let mut wal = self.wal.lock();
        if let Some(writer) = wal.as_mut() {
            writer.append(ops)?;
        }
        Ok(())
    }

    // =========================================================================
    // Pub/Sub
    // =========================================================================

    /// Publish a payload, returning the number of subscribers that got it
    pub fn publish(&self, channel: &str, payload: impl Into<Bytes>) -> usize {
        self.broker.publish(channel, payload.into())
    }

    /// Open a subscriber connection
    pub fn subscriber(&self) -> Subscriber {
        self.broker.subscriber()
    }

    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Write a snapshot and truncate the WAL
    ///
    /// No-op for an in-memory engine.
    pub fn checkpoint(&self) -> Result<()> {
        let Some(snapshot_path) = self.snapshot_path() else {
            return Ok(());
        };

        // Read lock blocks writers; WAL lock after keyspace lock as everywhere
        let keyspace = self.keyspace.read();
        let mut wal = self.wal.lock();
        let Some(writer) = wal.as_mut() else {
            return Ok(());
        };

        let last_lsn = writer.current_lsn() - 1;
        let size = Snapshot::write(&snapshot_path, last_lsn, &keyspace)?;
        writer.truncate()?;

        tracing::info!(
            "Checkpoint written: {} keys, {} bytes, last_lsn={}",
            keyspace.len(),
            size,
            last_lsn
        );
        Ok(())
    }

    /// Close the engine gracefully
    ///
    /// Checkpoints and syncs to disk
    pub fn close(self) -> Result<()> {
        self.checkpoint()?;

        if let Some(writer) = self.wal.lock().as_mut() {
            writer.sync()?;
        }

        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> Option<&Path> {
        self.config.data_dir.as_deref()
    }

    /// Whether writes reach disk
    pub fn is_persistent(&self) -> bool {
        self.config.data_dir.is_some()
    }

    /// Number of live keys
    pub fn key_count(&self) -> usize {
        self.keyspace.read().len()
    }

    /// LSN the next committed write will receive, if persistent
    pub fn next_lsn(&self) -> Option<u64> {
        self.wal.lock().as_ref().map(|w| w.current_lsn())
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn snapshot_path(&self) -> Option<PathBuf> {
        self.data_dir().map(|dir| dir.join(Self::SNAPSHOT_FILENAME))
    }
}
