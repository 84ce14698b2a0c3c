//! Sound Board Module
//!
//! Sounds, categories and join sounds on top of the key-value store.
//!
//! ## Responsibilities
//! - Allocate permanent ids for sounds and categories
//! - Keep the membership index mirrored in both directions
//! - Keep the case-insensitive name index unique and in sync with records
//! - Cascade deletes (emptied categories, join sounds, name entries)
//! - Assemble client-facing projections for reads
//!
//! ## Atomicity
//! Every public mutation is exactly one store transaction or batch. Readers
//! never see half of one; a failed mutation leaves nothing behind. Two
//! different mutations are not isolated from each other beyond that.

mod allocator;
mod joinsound;
pub mod keys;
mod membership;
mod model;
mod mutations;
mod names;
mod queries;

pub use allocator::IdKind;
pub use model::{Category, Sound, Unlinked};
pub use names::{normalize, SearchPattern};

use crate::config::Config;
use crate::connection::Connection;
use crate::error::Result;
use crate::pubsub::PubSubRelay;

/// Soundboard database over one store connection
#[derive(Clone)]
pub struct SoundBoard {
    connection: Connection,
}

impl SoundBoard {
    /// Use an existing connection; counters must be initialized separately
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Open the store described by `config` and initialize counters
    pub fn open(config: Config) -> Result<Self> {
        let board = Self::new(Connection::open(config)?);
        board.initialize()?;
        Ok(board)
    }

    /// A fresh in-memory board
    pub fn in_memory() -> Result<Self> {
        let board = Self::new(Connection::in_memory("soundkv"));
        board.initialize()?;
        Ok(board)
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// A pub/sub relay on a dedicated subscriber connection to the same store
    pub fn relay(&self) -> Result<PubSubRelay> {
        PubSubRelay::new(&self.connection)
    }

    /// Checkpoint the store to disk
    pub fn checkpoint(&self) -> Result<()> {
        self.connection.checkpoint()
    }

    /// Release the board's connection
    pub fn close(self) -> Result<()> {
        self.connection.close()
    }
}
