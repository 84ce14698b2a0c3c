//! Batches
//!
//! An unconditional list of writes committed as one atomic unit. Use a
//! batch when nothing needs to be read first; use a `Txn` otherwise.

use super::Op;

/// Ordered list of ops committed together by `Engine::exec`
#[derive(Debug, Clone, Default)]
pub struct Batch {
    ops: Vec<Op>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw op
    pub fn op(mut self, op: Op) -> Self {
        self.ops.push(op);
        self
    }

    pub fn set(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.op(Op::Set { key: key.into(), value: value.into() })
    }

    pub fn set_nx(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.op(Op::SetNx { key: key.into(), value: value.into() })
    }

    pub fn del(self, key: impl Into<String>) -> Self {
        self.op(Op::Del { key: key.into() })
    }

    pub fn sadd(self, key: impl Into<String>, member: impl Into<String>) -> Self {
        self.op(Op::SAdd { key: key.into(), member: member.into() })
    }

    pub fn srem(self, key: impl Into<String>, member: impl Into<String>) -> Self {
        self.op(Op::SRem { key: key.into(), member: member.into() })
    }

    pub fn hset(
        self,
        key: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.op(Op::HSet { key: key.into(), field: field.into(), value: value.into() })
    }

    pub fn hdel(self, key: impl Into<String>, field: impl Into<String>) -> Self {
        self.op(Op::HDel { key: key.into(), field: field.into() })
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<Op> {
        self.ops
    }
}
