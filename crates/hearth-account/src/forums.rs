use chrono::{DateTime, SubsecRound, Utc};
use hearth_db::Database;
use hearth_db::models::AccountForumRow;
use hearth_types::{AccountId, ForumId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::account::Account;
use crate::error::AccountError;

/// Last-note marker meaning "nothing read in this board yet".
pub const UNREAD: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// An account's read state for one board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountForum {
    pub forum_id: ForumId,
    /// Store record id, assigned the first time the entry is saved.
    pub id: Option<i64>,
    pub last_note: DateTime<Utc>,
    pub unsubscribed: bool,
    pub draft: Option<String>,
}

impl AccountForum {
    pub fn new(forum_id: ForumId) -> Self {
        Self {
            forum_id,
            id: None,
            last_note: UNREAD,
            unsubscribed: false,
            draft: None,
        }
    }

    fn to_row(&self, account_id: AccountId) -> AccountForumRow {
        AccountForumRow {
            id: self.id,
            account_id: account_id.get(),
            forum_id: self.forum_id.get(),
            last_note: self.last_note.timestamp(),
            unsubscribed: self.unsubscribed,
            draft: self.draft.clone(),
        }
    }
}

impl From<AccountForumRow> for AccountForum {
    fn from(row: AccountForumRow) -> Self {
        Self {
            forum_id: ForumId::new(row.forum_id),
            id: row.id,
            last_note: DateTime::from_timestamp(row.last_note, 0).unwrap_or(UNREAD),
            unsubscribed: row.unsubscribed,
            draft: row.draft,
        }
    }
}

/// Per-board read state, keyed by board id.
///
/// Sparse: a board without an entry is subscribed and unread. Entries appear
/// only once a board's state moves away from that default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForumStates {
    entries: Vec<AccountForum>,
}

impl ForumStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccountForum> {
        self.entries.iter()
    }

    pub fn get(&self, forum_id: ForumId) -> Option<&AccountForum> {
        self.entries.iter().find(|e| e.forum_id == forum_id)
    }

    /// The entry for a board, created with default state if missing.
    pub fn entry(&mut self, forum_id: ForumId) -> &mut AccountForum {
        let idx = match self.entries.iter().position(|e| e.forum_id == forum_id) {
            Some(idx) => idx,
            None => {
                self.entries.push(AccountForum::new(forum_id));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx]
    }

    pub fn last_note(&self, forum_id: ForumId) -> DateTime<Utc> {
        self.get(forum_id).map_or(UNREAD, |e| e.last_note)
    }

    /// Markers are kept to whole seconds, the resolution of the store.
    pub fn set_last_note(&mut self, forum_id: ForumId, when: DateTime<Utc>) {
        self.entry(forum_id).last_note = when.trunc_subsecs(0);
    }

    pub fn is_subscribed(&self, forum_id: ForumId) -> bool {
        self.get(forum_id).is_none_or(|e| !e.unsubscribed)
    }

    pub fn set_subscribed(&mut self, forum_id: ForumId, subscribed: bool) {
        if subscribed && self.get(forum_id).is_none() {
            return;
        }
        self.entry(forum_id).unsubscribed = !subscribed;
    }

    pub fn draft(&self, forum_id: ForumId) -> Option<&str> {
        self.get(forum_id).and_then(|e| e.draft.as_deref())
    }

    pub fn set_draft(&mut self, forum_id: ForumId, draft: Option<String>) {
        if draft.is_none() && self.get(forum_id).is_none() {
            return;
        }
        self.entry(forum_id).draft = draft;
    }
}

impl FromIterator<AccountForum> for ForumStates {
    fn from_iter<I: IntoIterator<Item = AccountForum>>(iter: I) -> Self {
        let mut states = Self::new();
        for entry in iter {
            let forum_id = entry.forum_id;
            *states.entry(forum_id) = entry;
        }
        states
    }
}

impl Account {
    /// Replace the cached board state with the store's current contents.
    /// On failure the previous cache, loaded or not, is kept.
    pub fn load_forums(&mut self, db: &Database) -> Result<(), AccountError> {
        let states = fetch_forums(db, self.id)?;
        debug!("Loaded {} forum records for {}", states.len(), self.login);
        self.forums.replace(states);
        Ok(())
    }

    /// Write every cached board entry and record the ids the store assigned.
    /// Nothing is written when the cache was never loaded.
    pub fn save_forums(&mut self, db: &Database) -> Result<(), AccountError> {
        let account_id = self.require_id()?;
        let Some(states) = self.forums.get_mut() else {
            return Ok(());
        };
        if states.is_empty() {
            return Ok(());
        }

        let rows: Vec<AccountForumRow> = states.iter().map(|e| e.to_row(account_id)).collect();
        let ids = db.save_account_forums(&rows)?;
        for (entry, id) in states.entries.iter_mut().zip(ids) {
            entry.id = Some(id);
        }
        debug!("Saved {} forum records for {}", rows.len(), self.login);
        Ok(())
    }

    /// Board state, loading it from the store on first use.
    pub fn forum_states(&mut self, db: &Database) -> Result<&mut ForumStates, AccountError> {
        let id = self.id;
        self.forums.get_or_try_load(|| fetch_forums(db, id))
    }

    /// When the account last read a note in its current board, or [`UNREAD`].
    pub fn forum_last_note(&mut self, db: &Database) -> Result<DateTime<Utc>, AccountError> {
        let forum = self.forum;
        Ok(self.forum_states(db)?.last_note(forum))
    }

    /// Record read progress in the current board, creating its entry if needed.
    pub fn set_forum_last_note(
        &mut self,
        db: &Database,
        when: DateTime<Utc>,
    ) -> Result<(), AccountError> {
        let forum = self.forum;
        self.forum_states(db)?.set_last_note(forum, when);
        Ok(())
    }

    /// Whether the account follows its current board. Boards are followed
    /// unless explicitly unsubscribed.
    pub fn forum_is_subscribed(&mut self, db: &Database) -> Result<bool, AccountError> {
        let forum = self.forum;
        Ok(self.forum_states(db)?.is_subscribed(forum))
    }

    pub fn set_forum_subscribed(
        &mut self,
        db: &Database,
        subscribed: bool,
    ) -> Result<(), AccountError> {
        let forum = self.forum;
        self.forum_states(db)?.set_subscribed(forum, subscribed);
        Ok(())
    }

    pub fn forum_draft(&mut self, db: &Database) -> Result<Option<&str>, AccountError> {
        let forum = self.forum;
        Ok(self.forum_states(db)?.draft(forum))
    }

    pub fn set_forum_draft(
        &mut self,
        db: &Database,
        draft: Option<String>,
    ) -> Result<(), AccountError> {
        let forum = self.forum;
        self.forum_states(db)?.set_draft(forum, draft);
        Ok(())
    }
}

fn fetch_forums(db: &Database, id: Option<AccountId>) -> Result<ForumStates, AccountError> {
    let Some(id) = id else {
        return Ok(ForumStates::new());
    };
    let rows = db.get_account_forums(id.get())?;
    Ok(rows.into_iter().map(AccountForum::from).collect())
}
