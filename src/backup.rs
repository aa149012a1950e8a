use chrono::{DateTime, Utc};

use crate::entity::Entity;
use crate::listing::Listing;
use crate::message::Message;
use crate::principal::Principal;
use crate::role::Role;

/// Point-in-time export of the console state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Backup {
    pub taken_at: DateTime<Utc>,
    pub ads: Vec<Entity<Listing>>,
    pub products: Vec<Entity<Listing>>,
    /// Trashed ads and products, restorable until purged.
    pub trash: Vec<Entity<Listing>>,
    pub categories: Vec<String>,
    pub roles: Vec<Role>,
    pub principals: Vec<Principal>,
    pub messages: Vec<Message>,
}

#[cfg(feature = "serde")]
impl Backup {
    /// Renders the backup as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parses a backup produced by [`Backup::to_json`].
    pub fn from_json(value: &str) -> serde_json::Result<Self> {
        serde_json::from_str(value)
    }
}
