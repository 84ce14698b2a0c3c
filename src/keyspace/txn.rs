//! Transactions
//!
//! A `Txn` is a closure-scoped view of the keyspace held under the engine's
//! write lock. It is the embedded equivalent of a server-side script: reads
//! and conditional writes happen with no other writer able to interleave.

use std::ops::Deref;

use crate::error::Result;

use super::{Keyspace, Op, Undo};

/// Exclusive read/write access to the keyspace for one composite operation.
///
/// Reads go through `Deref<Target = Keyspace>`, so every keyspace read method
/// is available directly and observes the transaction's own writes.
pub struct Txn<'a> {
    keyspace: &'a mut Keyspace,
    /// Ops that changed something, in application order (goes to the WAL)
    ops: Vec<Op>,
    /// Inverse of each entry in `ops`
    undo: Vec<Undo>,
}

impl<'a> Txn<'a> {
    pub(crate) fn new(keyspace: &'a mut Keyspace) -> Self {
        Self {
            keyspace,
            ops: Vec::new(),
            undo: Vec::new(),
        }
    }

    /// Apply a raw op and return its integer reply
    pub fn apply(&mut self, op: Op) -> Result<i64> {
        let (reply, undo) = self.keyspace.apply_logged(&op)?;
        if let Some(undo) = undo {
            self.undo.push(undo);
            self.ops.push(op);
        }
        Ok(reply)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.apply(Op::Set { key: key.into(), value: value.into() })?;
        Ok(())
    }

    /// Returns true if the key was created
    pub fn set_nx(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<bool> {
        Ok(self.apply(Op::SetNx { key: key.into(), value: value.into() })? == 1)
    }

    /// Returns the incremented value
    pub fn incr(&mut self, key: impl Into<String>) -> Result<i64> {
        self.apply(Op::Incr { key: key.into() })
    }

    /// Returns true if the key existed
    pub fn del(&mut self, key: impl Into<String>) -> Result<bool> {
        Ok(self.apply(Op::Del { key: key.into() })? == 1)
    }

    /// Returns true if the member was added
    pub fn sadd(&mut self, key: impl Into<String>, member: impl Into<String>) -> Result<bool> {
        Ok(self.apply(Op::SAdd { key: key.into(), member: member.into() })? == 1)
    }

    /// Returns true if the member was removed
    pub fn srem(&mut self, key: impl Into<String>, member: impl Into<String>) -> Result<bool> {
        Ok(self.apply(Op::SRem { key: key.into(), member: member.into() })? == 1)
    }

    pub fn hset(
        &mut self,
        key: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        self.apply(Op::HSet { key: key.into(), field: field.into(), value: value.into() })?;
        Ok(())
    }

    /// Returns true if the field was removed
    pub fn hdel(&mut self, key: impl Into<String>, field: impl Into<String>) -> Result<bool> {
        Ok(self.apply(Op::HDel { key: key.into(), field: field.into() })? == 1)
    }

    /// Undo every write, newest first
    pub(crate) fn rollback(self) {
        let Txn { keyspace, undo, .. } = self;
        for entry in undo.into_iter().rev() {
            keyspace.revert(entry);
        }
    }

    /// Finish the transaction, handing back what was written and how to undo it
    pub(crate) fn into_parts(self) -> (Vec<Op>, Vec<Undo>) {
        (self.ops, self.undo)
    }
}

impl Deref for Txn<'_> {
    type Target = Keyspace;

    fn deref(&self) -> &Keyspace {
        &*self.keyspace
    }
}
