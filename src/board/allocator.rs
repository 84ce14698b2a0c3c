//! Identifier allocation
//!
//! Ids are the post-increment value of a per-kind counter. Counters only
//! ever go up, so an id is never handed out twice, even after deletion.

use crate::error::{Result, SoundKvError};
use crate::keyspace::{Batch, Txn};

use super::{keys, SoundBoard};

/// Which counter to draw from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Sound,
    Category,
}

impl IdKind {
    pub fn counter_key(self) -> &'static str {
        match self {
            IdKind::Sound => keys::SOUND_COUNTER,
            IdKind::Category => keys::CATEGORY_COUNTER,
        }
    }
}

/// Allocate inside a larger transaction; rolled back with it on failure
pub(crate) fn allocate(tx: &mut Txn<'_>, kind: IdKind) -> Result<u64> {
    to_id(tx.incr(kind.counter_key())?, kind)
}

fn to_id(value: i64, kind: IdKind) -> Result<u64> {
    u64::try_from(value).map_err(|_| {
        SoundKvError::MalformedData(format!(
            "counter '{}' holds negative value {}",
            kind.counter_key(),
            value
        ))
    })
}

impl SoundBoard {
    /// Atomically allocate the next id of `kind`
    pub fn next_id(&self, kind: IdKind) -> Result<u64> {
        to_id(self.connection().incr(kind.counter_key())?, kind)
    }

    /// Create both counters at zero unless they already exist.
    ///
    /// Safe to call on every startup: an existing counter is never rewound.
    pub fn initialize(&self) -> Result<()> {
        let replies = self.connection().exec(
            Batch::new()
                .set_nx(keys::SOUND_COUNTER, "0")
                .set_nx(keys::CATEGORY_COUNTER, "0"),
        )?;
        if replies.iter().any(|&created| created == 1) {
            tracing::info!("Initialized id counters");
        }
        Ok(())
    }
}
