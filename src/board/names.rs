//! Name index
//!
//! Case-insensitive sound names. Three structures move together:
//! - `soundnames`: scan set of every lowercased name (substring search)
//! - `soundnames:{lower}`: forward lookup lower → id
//! - `sounds:{id}:lowername`: reverse lookup id → lower (sort key)
//!
//! At most one id owns a lowercased name; `claim` enforces it.

use crate::error::{Result, SoundKvError};
use crate::keyspace::{Keyspace, Txn};

use super::keys;

/// Lowercase form used by every index structure
pub fn normalize(name: &str) -> String {
    name.to_lowercase()
}

/// Resolve a lowercased name to its sound id
pub fn resolve(ks: &Keyspace, lowername: &str) -> Result<Option<u64>> {
    ks.get(&keys::name_forward(lowername))?
        .map(|raw| keys::parse_id(raw, "name index"))
        .transpose()
}

/// Point all three structures at `id` for `lowername`.
///
/// Fails with `Conflict` if another sound already owns the name.
pub(crate) fn claim(tx: &mut Txn<'_>, id: u64, lowername: &str) -> Result<()> {
    if let Some(owner) = resolve(tx, lowername)? {
        if owner != id {
            return Err(SoundKvError::Conflict(format!(
                "sound name '{}' is already used by sound {}",
                lowername, owner
            )));
        }
    }

    tx.sadd(keys::NAME_SCAN, lowername)?;
    tx.set(keys::name_forward(lowername), id.to_string())?;
    tx.set(keys::sound_lowername(id), lowername)?;
    Ok(())
}

/// Remove every index entry belonging to `id`, returning the name it had
pub(crate) fn release(tx: &mut Txn<'_>, id: u64) -> Result<Option<String>> {
    let Some(lowername) = tx.get(&keys::sound_lowername(id))?.map(str::to_owned) else {
        return Ok(None);
    };

    // Only drop forward/scan entries that still point here
    if resolve(tx, &lowername)? == Some(id) {
        tx.del(keys::name_forward(&lowername))?;
        tx.srem(keys::NAME_SCAN, lowername.as_str())?;
    }
    tx.del(keys::sound_lowername(id))?;

    Ok(Some(lowername))
}

/// Search query compiled to glob segments.
///
/// The query is lowercased and split on spaces; a name matches when the
/// segments occur in it in order, i.e. the glob `*seg1*seg2*…*`. A blank
/// query matches everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPattern {
    segments: Vec<String>,
}

impl SearchPattern {
    pub fn parse(query: &str) -> Self {
        let segments = normalize(query)
            .split(' ')
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The equivalent glob, e.g. `*air*horn*`
    pub fn glob(&self) -> String {
        let mut glob = String::from("*");
        for segment in &self.segments {
            glob.push_str(segment);
            glob.push('*');
        }
        glob
    }

    /// Test an already lowercased name
    pub fn matches(&self, lowername: &str) -> bool {
        let mut rest = lowername;
        for segment in &self.segments {
            match rest.find(segment.as_str()) {
                Some(at) => rest = &rest[at + segment.len()..],
                None => return false,
            }
        }
        true
    }
}

/// Ids of every sound whose lowercased name matches, in scan order
pub(crate) fn search(ks: &Keyspace, pattern: &SearchPattern) -> Result<Vec<u64>> {
    let mut ids = Vec::new();
    for lowername in ks.members(keys::NAME_SCAN)? {
        if !pattern.matches(lowername) {
            continue;
        }
        match resolve(ks, lowername)? {
            Some(id) => ids.push(id),
            None => tracing::warn!("Name '{}' is in the scan set but not indexed", lowername),
        }
    }
    Ok(ids)
}
