//! Configuration entry domain types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store-generated identifier of a configuration entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigEntryId(Uuid);

impl ConfigEntryId {
    /// Creates a new random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ConfigEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ConfigEntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for ConfigEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The user-supplied, mutable fields of an entry.
///
/// Used both to create an entry and to overwrite one on update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntryDraft {
    pub name: String,
    pub status: String,
    pub value: String,
    pub description: Option<String>,
}

/// A persisted server configuration entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub id: ConfigEntryId,
    #[serde(rename = "config_name")]
    pub name: String,
    pub status: String,
    pub value: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ConfigEntry {
    /// True while the entry has not been soft-deleted.
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Overwrite the mutable fields from a draft.
    pub(crate) fn apply(&mut self, draft: ConfigEntryDraft) {
        self.name = draft.name;
        self.status = draft.status;
        self.value = draft.value;
        self.description = draft.description;
    }
}
