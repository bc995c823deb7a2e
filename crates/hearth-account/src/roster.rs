use hearth_db::Database;
use hearth_db::models::AccountPlayerRow;
use hearth_types::{AccountId, CharacterId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::account::Account;
use crate::error::AccountError;

/// A character linked to an account.
///
/// Name and level are copies of the live character's values, taken when the
/// roster was last loaded; they can lag behind the game until the next load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPlayer {
    pub char_id: CharacterId,
    pub name: String,
    pub level: i16,
}

impl AccountPlayer {
    pub fn new(char_id: CharacterId, name: impl Into<String>, level: i16) -> Self {
        Self {
            char_id,
            name: name.into(),
            level,
        }
    }

    fn to_row(&self, account_id: AccountId) -> AccountPlayerRow {
        AccountPlayerRow {
            account_id: account_id.get(),
            char_id: self.char_id.get(),
            name: self.name.clone(),
            level: self.level,
        }
    }
}

impl From<AccountPlayerRow> for AccountPlayer {
    fn from(row: AccountPlayerRow) -> Self {
        Self {
            char_id: CharacterId::new(row.char_id),
            name: row.name,
            level: row.level,
        }
    }
}

impl Account {
    /// Replace the cached roster with the store's current contents.
    /// On failure the previous roster, loaded or not, is kept.
    pub fn load_players(&mut self, db: &Database) -> Result<(), AccountError> {
        let players = fetch_players(db, self.id)?;
        debug!("Loaded {} players for {}", players.len(), self.login);
        self.players.replace(players);
        Ok(())
    }

    /// The roster, loading it from the store on first use.
    pub fn players(&mut self, db: &Database) -> Result<&[AccountPlayer], AccountError> {
        let id = self.id;
        let players = self.players.get_or_try_load(|| fetch_players(db, id))?;
        Ok(players.as_slice())
    }

    pub fn find_player(
        &mut self,
        db: &Database,
        char_id: CharacterId,
    ) -> Result<Option<&AccountPlayer>, AccountError> {
        Ok(self.players(db)?.iter().find(|p| p.char_id == char_id))
    }

    /// Link a character to this account, or refresh its cached summary if it
    /// is already linked. A loaded roster is updated in place.
    pub fn link_player(
        &mut self,
        db: &Database,
        player: AccountPlayer,
    ) -> Result<(), AccountError> {
        let account_id = self.require_id()?;
        db.upsert_account_player(&player.to_row(account_id))?;

        if let Some(players) = self.players.get_mut() {
            match players.iter_mut().find(|p| p.char_id == player.char_id) {
                Some(existing) => *existing = player,
                None => players.push(player),
            }
        }
        Ok(())
    }

    pub fn unlink_player(
        &mut self,
        db: &Database,
        char_id: CharacterId,
    ) -> Result<(), AccountError> {
        let account_id = self.require_id()?;
        db.delete_account_player(account_id.get(), char_id.get())?;

        if let Some(players) = self.players.get_mut() {
            players.retain(|p| p.char_id != char_id);
        }
        if self.autologin_id == Some(char_id) {
            self.autologin_id = None;
        }
        Ok(())
    }

    /// The roster entry to select automatically on connect.
    ///
    /// The autologin id is only checked here, against a loaded roster, so it
    /// may be set before the roster has ever been read.
    pub fn autologin_player(
        &mut self,
        db: &Database,
    ) -> Result<Option<&AccountPlayer>, AccountError> {
        let Some(char_id) = self.autologin_id else {
            return Ok(None);
        };
        self.players(db)?
            .iter()
            .find(|p| p.char_id == char_id)
            .map(Some)
            .ok_or(AccountError::AutologinNotOnRoster(char_id))
    }
}

fn fetch_players(db: &Database, id: Option<AccountId>) -> Result<Vec<AccountPlayer>, AccountError> {
    // An account that was never saved has nothing in the store.
    let Some(id) = id else {
        return Ok(Vec::new());
    };
    let rows = db.get_account_players(id.get())?;
    Ok(rows.into_iter().map(AccountPlayer::from).collect())
}
