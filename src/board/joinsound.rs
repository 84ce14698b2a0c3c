//! Join sounds
//!
//! One hash, `joinsounds`, mapping a user identifier to a sound id.

use std::collections::BTreeMap;

use crate::error::{Result, SoundKvError};
use crate::keyspace::{Batch, Txn};

use super::model::Sound;
use super::mutations::not_found_sound;
use super::queries::hydrate_sound;
use super::{keys, membership, SoundBoard};

impl SoundBoard {
    /// Map `user` to a sound, replacing any previous mapping.
    ///
    /// Fails with `NotFound` if the sound does not exist.
    pub fn set_joinsound(&self, user: &str, sound_id: u64) -> Result<()> {
        self.connection().eval(|tx| {
            if !membership::sound_exists(tx, sound_id)? {
                return Err(not_found_sound(sound_id));
            }
            tx.hset(keys::JOINSOUNDS, user, sound_id.to_string())
        })?;

        tracing::debug!("Join sound for '{}' set to {}", user, sound_id);
        Ok(())
    }

    /// The sound mapped to `user`
    pub fn get_joinsound(&self, user: &str) -> Result<Sound> {
        self.connection().read(|ks| {
            let raw = ks.hget(keys::JOINSOUNDS, user)?.ok_or_else(|| {
                SoundKvError::NotFound(format!("join sound for user '{}'", user))
            })?;
            hydrate_sound(ks, keys::parse_id(raw, "join sound")?)
        })
    }

    /// Drop the mapping for `user`; returns whether one existed
    pub fn remove_joinsound(&self, user: &str) -> Result<bool> {
        let replies = self
            .connection()
            .exec(Batch::new().hdel(keys::JOINSOUNDS, user))?;
        Ok(replies.first() == Some(&1))
    }

    /// Every user → sound id mapping
    pub fn get_joinsounds(&self) -> Result<BTreeMap<String, u64>> {
        self.connection().read(|ks| {
            ks.hash(keys::JOINSOUNDS)?
                .into_iter()
                .flatten()
                .map(|(user, raw)| -> Result<(String, u64)> {
                    Ok((user.clone(), keys::parse_id(raw, "join sound")?))
                })
                .collect()
        })
    }
}

/// Remove every mapping that points at `sound_id`, returning how many.
///
/// Full scan of the map; join sounds are few per sound board.
pub(crate) fn purge_sound(tx: &mut Txn<'_>, sound_id: u64) -> Result<usize> {
    let target = sound_id.to_string();
    let users: Vec<String> = tx
        .hash(keys::JOINSOUNDS)?
        .into_iter()
        .flatten()
        .filter(|(_, value)| **value == target)
        .map(|(user, _)| user.clone())
        .collect();

    for user in &users {
        tx.hdel(keys::JOINSOUNDS, user.as_str())?;
    }
    Ok(users.len())
}
