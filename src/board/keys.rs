//! Key layout
//!
//! ```text
//! sounds:id                  string   last allocated sound id
//! categories:id              string   last allocated category id
//! sounds                     set      all sound ids
//! categories                 set      all category ids
//! sounds:{id}                hash     name, length, file, owner?
//! sounds:{id}:categories     set      category ids containing the sound
//! sounds:{id}:lowername      string   reverse name index
//! categories:{id}:name       string
//! categories:{id}:members    set      sound ids in the category
//! soundnames                 set      every lowercased sound name
//! soundnames:{lowername}     string   forward name index
//! joinsounds                 hash     user → sound id
//! ```

use crate::error::{Result, SoundKvError};

pub const SOUND_COUNTER: &str = "sounds:id";
pub const CATEGORY_COUNTER: &str = "categories:id";
pub const SOUNDS: &str = "sounds";
pub const CATEGORIES: &str = "categories";
pub const NAME_SCAN: &str = "soundnames";
pub const JOINSOUNDS: &str = "joinsounds";

pub fn sound(id: u64) -> String {
    format!("sounds:{}", id)
}

pub fn sound_categories(id: u64) -> String {
    format!("sounds:{}:categories", id)
}

pub fn sound_lowername(id: u64) -> String {
    format!("sounds:{}:lowername", id)
}

pub fn category_name(id: u64) -> String {
    format!("categories:{}:name", id)
}

pub fn category_members(id: u64) -> String {
    format!("categories:{}:members", id)
}

pub fn name_forward(lowername: &str) -> String {
    format!("{}:{}", NAME_SCAN, lowername)
}

/// Parse an id stored as a set member, hash value or string
pub fn parse_id(raw: &str, context: &str) -> Result<u64> {
    raw.parse().map_err(|_| {
        SoundKvError::MalformedData(format!("{}: '{}' is not a valid id", context, raw))
    })
}
