//! Client-facing records

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SoundKvError};

/// Hash fields of a sound record
pub(crate) const FIELD_NAME: &str = "name";
pub(crate) const FIELD_LENGTH: &str = "length";
pub(crate) const FIELD_FILE: &str = "file";
pub(crate) const FIELD_OWNER: &str = "owner";

/// A sound as stored in its primary record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sound {
    pub id: u64,
    pub name: String,
    /// Duration in seconds
    pub length: f64,
    /// Opaque reference to the audio file
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

/// A category with its live member count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    pub membercount: u64,
}

impl Sound {
    /// Decode a primary record
    pub(crate) fn from_record(id: u64, record: &BTreeMap<String, String>) -> Result<Self> {
        let field = |name: &str| {
            record.get(name).cloned().ok_or_else(|| {
                SoundKvError::MalformedData(format!("sound {} has no '{}' field", id, name))
            })
        };

        let raw_length = field(FIELD_LENGTH)?;
        let length = raw_length.parse::<f64>().map_err(|_| {
            SoundKvError::MalformedData(format!(
                "sound {} has non-numeric length '{}'",
                id, raw_length
            ))
        })?;

        Ok(Self {
            id,
            name: field(FIELD_NAME)?,
            length,
            file: field(FIELD_FILE)?,
            owner: record.get(FIELD_OWNER).cloned(),
        })
    }
}

/// Result of removing a sound from a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Unlinked {
    /// The pair existed and was removed
    pub removed: bool,
    /// The category lost its last member and was deleted
    pub category_deleted: bool,
}
