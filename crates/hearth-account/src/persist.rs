use hearth_db::Database;
use hearth_db::models::{AccountRow, NewAccountRow};
use hearth_types::{AccountId, CharacterId, Flags, ForumId};
use tracing::{debug, info, warn};

use crate::account::Account;
use crate::cache::Cache;
use crate::error::AccountError;
use crate::registry::ForumRegistry;

impl Account {
    /// Fill this account's identity from the record stored under `login`.
    ///
    /// A missing login is reported as [`AccountError::NotFound`]. The roster
    /// and board state are left unloaded; they are read on first use. A stored
    /// board that the registry no longer knows is replaced by the root board.
    pub fn load(
        &mut self,
        db: &Database,
        boards: &ForumRegistry,
        login: &str,
    ) -> Result<(), AccountError> {
        let row = db
            .get_account_by_login(login)?
            .ok_or_else(|| AccountError::NotFound {
                login: login.to_string(),
            })?;

        let stored_forum = ForumId::new(row.forum_id);
        let forum = if boards.contains(stored_forum) {
            stored_forum
        } else {
            warn!(
                "Account {} points at missing forum {}, using {}",
                row.login,
                stored_forum,
                boards.root().name
            );
            boards.root().id
        };

        self.id = Some(AccountId::new(row.id));
        self.login = row.login;
        self.email = row.email;
        self.password = row.password;
        self.timezone = row.timezone;
        self.autologin_id = row.autologin_id.map(CharacterId::new);
        self.flags = Flags::from_bits(row.flags as u64);
        self.forum = forum;
        self.in_progress = None;
        self.players = Cache::Unloaded;
        self.forums = Cache::Unloaded;

        debug!("Loaded account {} ({})", self.login, row.id);
        Ok(())
    }

    /// Store the identity fields. The first save assigns the account id; a
    /// login already taken by another record fails with a constraint error.
    /// Roster and board state are not written here.
    pub fn save(&mut self, db: &Database) -> Result<AccountId, AccountError> {
        let flags = self.flags.bits() as i64;
        let autologin_id = self.autologin_id.map(CharacterId::get);

        let id = match self.id {
            Some(id) => {
                db.update_account(&AccountRow {
                    id: id.get(),
                    login: self.login.clone(),
                    email: self.email.clone(),
                    password: self.password.clone(),
                    timezone: self.timezone,
                    autologin_id,
                    flags,
                    forum_id: self.forum.get(),
                })?;
                id
            }
            None => {
                let id = AccountId::new(db.create_account(&NewAccountRow {
                    login: &self.login,
                    email: &self.email,
                    password: &self.password,
                    timezone: self.timezone,
                    autologin_id,
                    flags,
                    forum_id: self.forum.get(),
                })?);
                info!("Account {} created ({})", self.login, id);
                self.id = Some(id);
                id
            }
        };
        Ok(id)
    }

    /// Remove the account record along with its roster and board state.
    /// Deleting an account that is not stored reports not-found.
    ///
    /// On success the instance is unsaved again: it has no id and both caches
    /// are unloaded, so a later `save` registers it afresh.
    pub fn delete(&mut self, db: &Database) -> Result<(), AccountError> {
        let Some(id) = self.id else {
            return Err(AccountError::NotFound {
                login: self.login.clone(),
            });
        };
        db.delete_account(id.get())?;
        self.id = None;
        self.players.invalidate();
        self.forums.invalidate();
        info!("Account {} deleted ({})", self.login, id);
        Ok(())
    }
}
