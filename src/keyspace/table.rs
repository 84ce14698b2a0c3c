//! Keyspace implementation
//!
//! BTreeMap of typed values. Locking is the engine's job; every method here
//! assumes the caller already holds the appropriate guard.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SoundKvError};

use super::{Op, Undo, Value};

/// Typed key space for all store records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyspace {
    data: BTreeMap<String, Value>,
}

impl Keyspace {
    /// Create a new empty keyspace
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the keyspace holds no keys
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over all keys in order
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    /// Check whether a key exists (any type)
    pub fn exists(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Get the string stored at `key`
    pub fn get(&self, key: &str) -> Result<Option<&str>> {
        match self.data.get(key) {
            None => Ok(None),
            Some(Value::Str(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(wrong_type(key, other, "string")),
        }
    }

    /// Get the set stored at `key`
    pub fn set(&self, key: &str) -> Result<Option<&BTreeSet<String>>> {
        match self.data.get(key) {
            None => Ok(None),
            Some(Value::Set(s)) => Ok(Some(s)),
            Some(other) => Err(wrong_type(key, other, "set")),
        }
    }

    /// Iterate over the members of the set at `key` (empty if missing)
    pub fn members(&self, key: &str) -> Result<impl Iterator<Item = &String> + '_> {
        Ok(self.set(key)?.into_iter().flatten())
    }

    /// Collect the members of the set at `key`
    pub fn smembers(&self, key: &str) -> Result<Vec<String>> {
        Ok(self.members(key)?.cloned().collect())
    }

    /// Check set membership
    pub fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        Ok(self.set(key)?.is_some_and(|s| s.contains(member)))
    }

    /// Cardinality of the set at `key`
    pub fn scard(&self, key: &str) -> Result<usize> {
        Ok(self.set(key)?.map_or(0, |s| s.len()))
    }

    /// Get the hash stored at `key`
    pub fn hash(&self, key: &str) -> Result<Option<&BTreeMap<String, String>>> {
        match self.data.get(key) {
            None => Ok(None),
            Some(Value::Hash(h)) => Ok(Some(h)),
            Some(other) => Err(wrong_type(key, other, "hash")),
        }
    }

    /// Get a single hash field
    pub fn hget(&self, key: &str, field: &str) -> Result<Option<&str>> {
        Ok(self.hash(key)?.and_then(|h| h.get(field)).map(String::as_str))
    }

    /// Copy out every field of the hash at `key` (empty if missing)
    pub fn hgetall(&self, key: &str) -> Result<BTreeMap<String, String>> {
        Ok(self.hash(key)?.cloned().unwrap_or_default())
    }

    /// Number of fields in the hash at `key`
    pub fn hlen(&self, key: &str) -> Result<usize> {
        Ok(self.hash(key)?.map_or(0, |h| h.len()))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Apply an op outside of any transaction (used for WAL replay)
    pub fn apply(&mut self, op: &Op) -> Result<i64> {
        self.apply_logged(op).map(|(reply, _)| reply)
    }

    /// Apply an op and return its integer reply plus the record needed to
    /// undo it. Ops that change nothing return no undo record.
    pub(crate) fn apply_logged(&mut self, op: &Op) -> Result<(i64, Option<Undo>)> {
        match op {
            Op::Set { key, value } => {
                let prior = self.data.insert(key.clone(), Value::Str(value.clone()));
                Ok((1, Some(Undo::Restore { key: key.clone(), value: prior })))
            }
            Op::SetNx { key, value } => {
                if self.data.contains_key(key) {
                    return Ok((0, None));
                }
                self.data.insert(key.clone(), Value::Str(value.clone()));
                Ok((1, Some(Undo::Restore { key: key.clone(), value: None })))
            }
            Op::Incr { key } => {
                let current = match self.data.get(key) {
                    None => 0,
                    Some(Value::Str(s)) => s.parse::<i64>().map_err(|_| {
                        SoundKvError::Storage(format!("value at '{}' is not an integer", key))
                    })?,
                    Some(other) => return Err(wrong_type(key, other, "string")),
                };
                let next = current.checked_add(1).ok_or_else(|| {
                    SoundKvError::Storage(format!("increment of '{}' would overflow", key))
                })?;
                let prior = self.data.insert(key.clone(), Value::Str(next.to_string()));
                Ok((next, Some(Undo::Restore { key: key.clone(), value: prior })))
            }
            Op::Del { key } => match self.data.remove(key) {
                Some(value) => Ok((1, Some(Undo::Restore { key: key.clone(), value: Some(value) }))),
                None => Ok((0, None)),
            },
            Op::SAdd { key, member } => {
                let set = match self.data.entry(key.clone()) {
                    Entry::Vacant(slot) => match slot.insert(Value::Set(BTreeSet::new())) {
                        Value::Set(s) => s,
                        _ => unreachable!("freshly inserted value is a set"),
                    },
                    Entry::Occupied(slot) => match slot.into_mut() {
                        Value::Set(s) => s,
                        other => return Err(wrong_type(key, other, "set")),
                    },
                };
                if set.insert(member.clone()) {
                    Ok((1, Some(Undo::SRem { key: key.clone(), member: member.clone() })))
                } else {
                    Ok((0, None))
                }
            }
            Op::SRem { key, member } => {
                let (removed, now_empty) = match self.data.get_mut(key) {
                    None => return Ok((0, None)),
                    Some(Value::Set(s)) => (s.remove(member), s.is_empty()),
                    Some(other) => return Err(wrong_type(key, other, "set")),
                };
                if now_empty {
                    self.data.remove(key);
                }
                if removed {
                    Ok((1, Some(Undo::SAdd { key: key.clone(), member: member.clone() })))
                } else {
                    Ok((0, None))
                }
            }
            Op::HSet { key, field, value } => {
                let hash = match self.data.entry(key.clone()) {
                    Entry::Vacant(slot) => match slot.insert(Value::Hash(BTreeMap::new())) {
                        Value::Hash(h) => h,
                        _ => unreachable!("freshly inserted value is a hash"),
                    },
                    Entry::Occupied(slot) => match slot.into_mut() {
                        Value::Hash(h) => h,
                        other => return Err(wrong_type(key, other, "hash")),
                    },
                };
                let prior = hash.insert(field.clone(), value.clone());
                let reply = if prior.is_none() { 1 } else { 0 };
                Ok((
                    reply,
                    Some(Undo::HRestore { key: key.clone(), field: field.clone(), value: prior }),
                ))
            }
            Op::HDel { key, field } => {
                let (removed, now_empty) = match self.data.get_mut(key) {
                    None => return Ok((0, None)),
                    Some(Value::Hash(h)) => (h.remove(field), h.is_empty()),
                    Some(other) => return Err(wrong_type(key, other, "hash")),
                };
                if now_empty {
                    self.data.remove(key);
                }
                match removed {
                    Some(old) => Ok((
                        1,
                        Some(Undo::HRestore { key: key.clone(), field: field.clone(), value: Some(old) }),
                    )),
                    None => Ok((0, None)),
                }
            }
        }
    }

    /// Reverse a previously applied op
    pub(crate) fn revert(&mut self, undo: Undo) {
        match undo {
            Undo::Restore { key, value } => match value {
                Some(v) => {
                    self.data.insert(key, v);
                }
                None => {
                    self.data.remove(&key);
                }
            },
            Undo::SRem { key, member } => {
                let now_empty = match self.data.get_mut(&key) {
                    Some(Value::Set(s)) => {
                        s.remove(&member);
                        s.is_empty()
                    }
                    _ => false,
                };
                if now_empty {
                    self.data.remove(&key);
                }
            }
            Undo::SAdd { key, member } => {
                if let Value::Set(s) = self
                    .data
                    .entry(key)
                    .or_insert_with(|| Value::Set(BTreeSet::new()))
                {
                    s.insert(member);
                }
            }
            Undo::HRestore { key, field, value: Some(v) } => {
                if let Value::Hash(h) = self
                    .data
                    .entry(key)
                    .or_insert_with(|| Value::Hash(BTreeMap::new()))
                {
                    h.insert(field, v);
                }
            }
            Undo::HRestore { key, field, value: None } => {
                let now_empty = match self.data.get_mut(&key) {
                    Some(Value::Hash(h)) => {
                        h.remove(&field);
                        h.is_empty()
                    }
                    _ => false,
                };
                if now_empty {
                    self.data.remove(&key);
                }
            }
        }
    }
}

fn wrong_type(key: &str, found: &Value, expected: &str) -> SoundKvError {
    SoundKvError::Storage(format!(
        "WRONGTYPE key '{}' holds a {}, expected a {}",
        key,
        found.type_name(),
        expected
    ))
}
