//! Query engine
//!
//! Read-side joins. Each query is one `read` closure, so it sees a single
//! consistent state of the store.

use crate::error::{Result, SoundKvError};
use crate::keyspace::Keyspace;

use super::model::{Category, Sound};
use super::mutations::{not_found_category, not_found_sound};
use super::names::{self, SearchPattern};
use super::{keys, membership, SoundBoard};

impl SoundBoard {
    /// All categories by name, with live member counts
    pub fn get_categories(&self) -> Result<Vec<Category>> {
        self.connection().read(|ks| {
            let mut categories = ks
                .members(keys::CATEGORIES)?
                .map(|raw| hydrate_category(ks, keys::parse_id(raw, "category set")?))
                .collect::<Result<Vec<_>>>()?;
            categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
            Ok(categories)
        })
    }

    /// Sounds in a category, by name
    pub fn get_sounds_in_category(&self, category_id: u64) -> Result<Vec<Sound>> {
        self.connection().read(|ks| {
            if !membership::category_exists(ks, category_id)? {
                return Err(not_found_category(category_id));
            }
            let mut sounds = ks
                .members(&keys::category_members(category_id))?
                .map(|raw| hydrate_sound(ks, keys::parse_id(raw, "category members")?))
                .collect::<Result<Vec<_>>>()?;
            sounds.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
            Ok(sounds)
        })
    }

    /// Categories containing a sound (unordered), with live member counts
    pub fn get_categories_for_sound(&self, sound_id: u64) -> Result<Vec<Category>> {
        self.connection().read(|ks| {
            if !membership::sound_exists(ks, sound_id)? {
                return Err(not_found_sound(sound_id));
            }
            ks.members(&keys::sound_categories(sound_id))?
                .map(|raw| hydrate_category(ks, keys::parse_id(raw, "sound categories")?))
                .collect()
        })
    }

    /// All sounds, ordered by lowercased name.
    ///
    /// Sort keys come from the reverse name index rather than the records.
    pub fn get_sounds(&self) -> Result<Vec<Sound>> {
        self.connection().read(|ks| {
            let mut keyed = Vec::new();
            for raw in ks.members(keys::SOUNDS)? {
                let id = keys::parse_id(raw, "sound set")?;
                let lowername = ks.get(&keys::sound_lowername(id))?.ok_or_else(|| {
                    SoundKvError::MalformedData(format!("sound {} has no name index entry", id))
                })?;
                keyed.push((lowername, id));
            }
            keyed.sort_unstable();

            keyed.into_iter().map(|(_, id)| hydrate_sound(ks, id)).collect()
        })
    }

    pub fn get_sound_by_id(&self, id: u64) -> Result<Sound> {
        self.connection().read(|ks| hydrate_sound(ks, id))
    }

    /// Case-insensitive substring search. Result order is unspecified.
    pub fn search_sounds(&self, query: &str) -> Result<Vec<Sound>> {
        let pattern = SearchPattern::parse(query);
        tracing::trace!("Searching sounds with pattern {}", pattern.glob());

        self.connection().read(|ks| {
            names::search(ks, &pattern)?
                .into_iter()
                .map(|id| hydrate_sound(ks, id))
                .collect()
        })
    }

    /// Number of sounds
    pub fn get_sounds_number(&self) -> Result<u64> {
        self.connection().read(|ks| Ok(ks.scard(keys::SOUNDS)? as u64))
    }
}

/// Load a sound's primary record
pub(crate) fn hydrate_sound(ks: &Keyspace, id: u64) -> Result<Sound> {
    let record = ks.hash(&keys::sound(id))?.ok_or_else(|| not_found_sound(id))?;
    Sound::from_record(id, record)
}

/// Load a category with its live member count
pub(crate) fn hydrate_category(ks: &Keyspace, id: u64) -> Result<Category> {
    let name = ks
        .get(&keys::category_name(id))?
        .ok_or_else(|| not_found_category(id))?;
    Ok(Category {
        id,
        name: name.to_string(),
        membercount: membership::member_count(ks, id)?,
    })
}
