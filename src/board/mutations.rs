//! Atomic mutations
//!
//! Every composite write runs as one store transaction (or one batch when
//! nothing has to be read first). A failure anywhere rolls the whole
//! operation back.

use crate::error::{Result, SoundKvError};

use super::allocator::{self, IdKind};
use super::model::{Category, Sound, Unlinked, FIELD_FILE, FIELD_LENGTH, FIELD_NAME, FIELD_OWNER};
use super::queries::hydrate_sound;
use super::{joinsound, keys, membership, names, SoundBoard};

impl SoundBoard {
    /// Create a sound and index its name.
    ///
    /// Fails with `Conflict` if a sound with the same name (ignoring case)
    /// exists; no id is consumed in that case.
    pub fn create_sound(
        &self,
        name: &str,
        length: f64,
        file: &str,
        owner: Option<&str>,
    ) -> Result<Sound> {
        if name.trim().is_empty() {
            return Err(SoundKvError::InvalidArgument("sound name is empty".to_string()));
        }
        if !length.is_finite() || length < 0.0 {
            return Err(SoundKvError::InvalidArgument(format!(
                "sound length must be a non-negative number, got {}",
                length
            )));
        }

        let lowername = names::normalize(name);
        let sound = self.connection().eval(|tx| {
            let id = allocator::allocate(tx, IdKind::Sound)?;
            names::claim(tx, id, &lowername)?;

            let record = keys::sound(id);
            tx.hset(record.as_str(), FIELD_NAME, name)?;
            tx.hset(record.as_str(), FIELD_LENGTH, length.to_string())?;
            tx.hset(record.as_str(), FIELD_FILE, file)?;
            if let Some(owner) = owner {
                tx.hset(record.as_str(), FIELD_OWNER, owner)?;
            }
            tx.sadd(keys::SOUNDS, id.to_string())?;

            Ok(Sound {
                id,
                name: name.to_string(),
                length,
                file: file.to_string(),
                owner: owner.map(str::to_owned),
            })
        })?;

        tracing::debug!("Created sound {} '{}'", sound.id, sound.name);
        Ok(sound)
    }

    /// Create an empty category
    pub fn create_category(&self, name: &str) -> Result<Category> {
        if name.trim().is_empty() {
            return Err(SoundKvError::InvalidArgument("category name is empty".to_string()));
        }

        let id = self.connection().eval(|tx| {
            let id = allocator::allocate(tx, IdKind::Category)?;
            tx.sadd(keys::CATEGORIES, id.to_string())?;
            tx.set(keys::category_name(id), name)?;
            Ok(id)
        })?;

        tracing::debug!("Created category {} '{}'", id, name);
        Ok(Category {
            id,
            name: name.to_string(),
            membercount: 0,
        })
    }

    /// Put a sound into a category (both projections at once).
    ///
    /// Fails with `NotFound` if either side does not exist.
    pub fn add_sound_to_category(&self, sound_id: u64, category_id: u64) -> Result<()> {
        self.connection().eval(|tx| {
            if !membership::sound_exists(tx, sound_id)? {
                return Err(not_found_sound(sound_id));
            }
            if !membership::category_exists(tx, category_id)? {
                return Err(not_found_category(category_id));
            }
            membership::link(tx, sound_id, category_id)?;
            Ok(())
        })?;

        tracing::debug!("Added sound {} to category {}", sound_id, category_id);
        Ok(())
    }

    /// Take a sound out of a category, deleting the category if that was
    /// its last member.
    pub fn remove_sound_from_category(&self, category_id: u64, sound_id: u64) -> Result<Unlinked> {
        let outcome = self.connection().eval(|tx| {
            if !membership::category_exists(tx, category_id)? {
                return Err(not_found_category(category_id));
            }
            let removed = membership::unlink(tx, sound_id, category_id)?;
            let category_deleted = removed && membership::prune_if_empty(tx, category_id)?;
            Ok(Unlinked { removed, category_deleted })
        })?;

        tracing::debug!(
            "Removed sound {} from category {}: {:?}",
            sound_id,
            category_id,
            outcome
        );
        Ok(outcome)
    }

    /// Delete a sound and everything that points at it.
    ///
    /// Categories left without members are deleted too.
    pub fn delete_sound(&self, id: u64) -> Result<()> {
        let (emptied, joins) = self.connection().eval(|tx| {
            if !membership::sound_exists(tx, id)? {
                return Err(not_found_sound(id));
            }

            let mut emptied = Vec::new();
            for raw in tx.smembers(&keys::sound_categories(id))? {
                let category_id = keys::parse_id(&raw, "sound categories")?;
                membership::unlink(tx, id, category_id)?;
                if membership::prune_if_empty(tx, category_id)? {
                    emptied.push(category_id);
                }
            }

            tx.srem(keys::SOUNDS, id.to_string())?;
            tx.del(keys::sound(id))?;
            tx.del(keys::sound_categories(id))?;
            names::release(tx, id)?;
            let joins = joinsound::purge_sound(tx, id)?;

            Ok((emptied, joins))
        })?;

        tracing::debug!(
            "Deleted sound {} (emptied categories: {:?}, join sounds cleared: {})",
            id,
            emptied,
            joins
        );
        Ok(())
    }

    /// Delete a category. Member sounds stay; only their back-references go.
    pub fn delete_category(&self, id: u64) -> Result<()> {
        self.connection().eval(|tx| {
            if !membership::category_exists(tx, id)? {
                return Err(not_found_category(id));
            }

            membership::drop_category_records(tx, id)?;
            for raw in tx.smembers(keys::SOUNDS)? {
                let sound_id = keys::parse_id(&raw, "sound set")?;
                tx.srem(keys::sound_categories(sound_id), id.to_string())?;
            }
            Ok(())
        })?;

        tracing::debug!("Deleted category {}", id);
        Ok(())
    }

    /// Rename a sound, moving its name index entries in the same transaction.
    ///
    /// Fails with `Conflict` if another sound already has the new name
    /// (ignoring case). Changing only the case of a sound's own name is fine.
    pub fn rename_sound(&self, id: u64, new_name: &str) -> Result<Sound> {
        if new_name.trim().is_empty() {
            return Err(SoundKvError::InvalidArgument("sound name is empty".to_string()));
        }

        let lowername = names::normalize(new_name);
        let (old, sound) = self.connection().eval(|tx| {
            if !membership::sound_exists(tx, id)? {
                return Err(not_found_sound(id));
            }
            let old = names::release(tx, id)?;
            names::claim(tx, id, &lowername)?;
            tx.hset(keys::sound(id), FIELD_NAME, new_name)?;
            Ok((old, hydrate_sound(tx, id)?))
        })?;

        tracing::debug!("Renamed sound {}: {:?} -> '{}'", id, old, lowername);
        Ok(sound)
    }
}

pub(crate) fn not_found_sound(id: u64) -> SoundKvError {
    SoundKvError::NotFound(format!("sound {}", id))
}

pub(crate) fn not_found_category(id: u64) -> SoundKvError {
    SoundKvError::NotFound(format!("category {}", id))
}
