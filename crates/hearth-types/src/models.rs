use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ForumId;

/// A discussion board as known to the board registry.
/// Board content (threads, notes) lives in the forum engine, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forum {
    pub id: ForumId,
    pub name: String,
}

impl Forum {
    pub fn new(id: ForumId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A note being composed. The body is opaque to the account layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub forum_id: ForumId,
    pub from: String,
    pub to_list: String,
    pub subject: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}
