//! Keyspace Module
//!
//! In-memory typed key space backing every SoundKV record.
//!
//! ## Responsibilities
//! - Hold strings, sets and hashes under string keys
//! - Apply write operations (`Op`) with Redis-like integer replies
//! - Produce undo records so a failed transaction can be rolled back
//! - Group operations into atomic batches and transactions
//!
//! ## Data Structure Choice
//! BTreeMap keyed by `String`, owned by the engine behind a single RwLock:
//! - Ordered keys give deterministic snapshots
//! - One lock around the whole keyspace makes a transaction a plain
//!   critical section (the "server-evaluated script" model)
//! - Sets and hashes are ordered too, so scans are stable between runs

mod batch;
mod table;
mod txn;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

pub use batch::Batch;
pub use table::Keyspace;
pub use txn::Txn;

/// A value stored under a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// A plain string (also used for integer counters)
    Str(String),

    /// An ordered set of members
    Set(BTreeSet<String>),

    /// An ordered field → value map
    Hash(BTreeMap<String, String>),
}

impl Value {
    /// Type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Set(_) => "set",
            Value::Hash(_) => "hash",
        }
    }
}

/// A single write operation against the keyspace.
///
/// Ops are the unit recorded in the WAL, so they must stay deterministic:
/// replaying the same ops on the same keyspace yields the same result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    /// Overwrite `key` with a string, whatever it held before
    Set { key: String, value: String },

    /// Write `key` only if it does not exist
    SetNx { key: String, value: String },

    /// Increment the integer stored at `key` (missing counts as 0)
    Incr { key: String },

    /// Remove `key` entirely
    Del { key: String },

    /// Add a member to the set at `key`
    SAdd { key: String, member: String },

    /// Remove a member from the set at `key`
    SRem { key: String, member: String },

    /// Set a field of the hash at `key`
    HSet {
        key: String,
        field: String,
        value: String,
    },

    /// Remove a field from the hash at `key`
    HDel { key: String, field: String },
}

impl Op {
    /// The key this op writes
    pub fn key(&self) -> &str {
        match self {
            Op::Set { key, .. }
            | Op::SetNx { key, .. }
            | Op::Incr { key }
            | Op::Del { key }
            | Op::SAdd { key, .. }
            | Op::SRem { key, .. }
            | Op::HSet { key, .. }
            | Op::HDel { key, .. } => key,
        }
    }
}

/// Inverse of an applied op, replayed in reverse order on rollback
#[derive(Debug, Clone)]
pub(crate) enum Undo {
    /// Put back (or remove) the whole value at a key
    Restore { key: String, value: Option<Value> },

    /// Remove a member that the op added
    SRem { key: String, member: String },

    /// Re-add a member that the op removed
    SAdd { key: String, member: String },

    /// Put back (or remove) a single hash field
    HRestore {
        key: String,
        field: String,
        value: Option<String>,
    },
}
