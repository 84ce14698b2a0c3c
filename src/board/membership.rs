//! Membership index
//!
//! One relation, two projections: `categories:{c}:members` and
//! `sounds:{s}:categories`. Both are only ever written through `link` and
//! `unlink`, inside a single transaction, so they cannot drift apart.

use crate::error::Result;
use crate::keyspace::{Keyspace, Txn};

use super::keys;

pub(crate) fn sound_exists(ks: &Keyspace, id: u64) -> Result<bool> {
    ks.sismember(keys::SOUNDS, &id.to_string())
}

pub(crate) fn category_exists(ks: &Keyspace, id: u64) -> Result<bool> {
    ks.sismember(keys::CATEGORIES, &id.to_string())
}

/// Live member count of a category
pub(crate) fn member_count(ks: &Keyspace, category_id: u64) -> Result<u64> {
    Ok(ks.scard(&keys::category_members(category_id))? as u64)
}

/// Insert the pair into both projections; true if anything changed
pub(crate) fn link(tx: &mut Txn<'_>, sound_id: u64, category_id: u64) -> Result<bool> {
    let added_member = tx.sadd(keys::category_members(category_id), sound_id.to_string())?;
    let added_category = tx.sadd(keys::sound_categories(sound_id), category_id.to_string())?;
    Ok(added_member || added_category)
}

/// Remove the pair from both projections; true if anything changed
pub(crate) fn unlink(tx: &mut Txn<'_>, sound_id: u64, category_id: u64) -> Result<bool> {
    let removed_member = tx.srem(keys::category_members(category_id), sound_id.to_string())?;
    let removed_category = tx.srem(keys::sound_categories(sound_id), category_id.to_string())?;
    Ok(removed_member || removed_category)
}

/// Delete the category if it has no members left
pub(crate) fn prune_if_empty(tx: &mut Txn<'_>, category_id: u64) -> Result<bool> {
    if member_count(tx, category_id)? > 0 {
        return Ok(false);
    }
    drop_category_records(tx, category_id)?;
    tracing::debug!("Category {} emptied and removed", category_id);
    Ok(true)
}

/// Remove a category's own records (global set entry, name, members)
pub(crate) fn drop_category_records(tx: &mut Txn<'_>, category_id: u64) -> Result<()> {
    tx.srem(keys::CATEGORIES, category_id.to_string())?;
    tx.del(keys::category_name(category_id))?;
    tx.del(keys::category_members(category_id))?;
    Ok(())
}
