use hearth_types::flags::lookup_bit;
use hearth_types::{
    ACCOUNT_FLAGS, AccountFlag, AccountId, CharacterId, ConnectionId, FlagError, Flags, ForumId,
    Note,
};

use crate::cache::Cache;
use crate::error::AccountError;
use crate::forums::ForumStates;
use crate::registry::ForumRegistry;
use crate::roster::AccountPlayer;

/// A user account: login identity, linked characters and board read state.
///
/// Owned by one session at a time. The connection, the character being played
/// and the current board are held as ids only; the session, the game and the
/// board registry own the things they name.
#[derive(Debug, Clone)]
pub struct Account {
    pub(crate) id: Option<AccountId>,
    pub(crate) login: String,
    pub email: String,
    /// Already encrypted by the caller; stored and compared as-is.
    pub password: String,
    pub timezone: i32,
    pub autologin_id: Option<CharacterId>,
    pub flags: Flags,
    pub(crate) forum: ForumId,
    pub in_progress: Option<Note>,
    pub(crate) players: Cache<Vec<AccountPlayer>>,
    pub(crate) forums: Cache<ForumStates>,
    conn: Option<ConnectionId>,
    pub playing: Option<CharacterId>,
}

impl Account {
    /// An empty account shell, ready for [`Account::load`].
    pub fn new(conn: Option<ConnectionId>, boards: &ForumRegistry) -> Self {
        Self::with_login(conn, boards, "")
    }

    /// A brand new account that will get its id on first save.
    pub fn with_login(
        conn: Option<ConnectionId>,
        boards: &ForumRegistry,
        login: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            login: login.into(),
            email: String::new(),
            password: String::new(),
            timezone: 0,
            autologin_id: None,
            flags: Flags::empty(),
            forum: boards.root().id,
            in_progress: None,
            players: Cache::Unloaded,
            forums: Cache::Unloaded,
            conn,
            playing: None,
        }
    }

    pub fn id(&self) -> Option<AccountId> {
        self.id
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    /// The board the account is currently reading.
    pub fn forum(&self) -> ForumId {
        self.forum
    }

    /// Move the board cursor. Ids unknown to the registry are refused, so the
    /// cursor always names a real board.
    pub fn set_forum(
        &mut self,
        boards: &ForumRegistry,
        forum: ForumId,
    ) -> Result<(), AccountError> {
        if !boards.contains(forum) {
            return Err(AccountError::UnknownForum(forum));
        }
        self.forum = forum;
        Ok(())
    }

    pub fn connection(&self) -> Option<ConnectionId> {
        self.conn
    }

    pub fn attach(&mut self, conn: ConnectionId) {
        self.conn = Some(conn);
    }

    /// Forget the session and the character played through it.
    pub fn detach(&mut self) {
        self.conn = None;
        self.playing = None;
    }

    pub fn has_flag(&self, flag: AccountFlag) -> bool {
        self.flags.test(flag.bit())
    }

    pub fn set_flag(&mut self, flag: AccountFlag, on: bool) {
        if on {
            self.flags.set(flag.bit());
        } else {
            self.flags.clear(flag.bit());
        }
    }

    /// Set or clear a flag named in [`ACCOUNT_FLAGS`]. Returns true if the
    /// flag changed.
    pub fn set_flag_by_name(&mut self, name: &str, on: bool) -> Result<bool, AccountError> {
        let bit = lookup_bit(ACCOUNT_FLAGS, name)
            .ok_or_else(|| FlagError::Unknown(name.to_string()))?;
        Ok(if on {
            self.flags.set(bit)
        } else {
            self.flags.clear(bit)
        })
    }

    pub fn wants_color(&self) -> bool {
        !self.has_flag(AccountFlag::ColorOff)
    }

    /// The roster, if it has been loaded.
    pub fn cached_players(&self) -> Option<&[AccountPlayer]> {
        self.players.get().map(Vec::as_slice)
    }

    /// Board state, if it has been loaded.
    pub fn cached_forums(&self) -> Option<&ForumStates> {
        self.forums.get()
    }

    pub(crate) fn require_id(&self) -> Result<AccountId, AccountError> {
        self.id.ok_or_else(|| AccountError::Unsaved {
            login: self.login.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_types::Forum;

    fn boards() -> ForumRegistry {
        let mut boards = ForumRegistry::default();
        boards.insert(Forum::new(ForumId::new(2), "help"));
        boards
    }

    #[test]
    fn new_account_starts_on_the_root_board() {
        let boards = boards();
        let conn = ConnectionId::new();
        let account = Account::new(Some(conn), &boards);

        assert_eq!(account.forum(), boards.root().id);
        assert_eq!(account.connection(), Some(conn));
        assert_eq!(account.id(), None);
        assert!(account.cached_players().is_none());
        assert!(account.cached_forums().is_none());
    }

    #[test]
    fn cursor_only_accepts_registered_boards() {
        let boards = boards();
        let mut account = Account::with_login(None, &boards, "rjennings");

        account.set_forum(&boards, ForumId::new(2)).unwrap();
        assert_eq!(account.forum(), ForumId::new(2));

        let err = account.set_forum(&boards, ForumId::new(9)).unwrap_err();
        assert!(matches!(err, AccountError::UnknownForum(id) if id == ForumId::new(9)));
        assert_eq!(account.forum(), ForumId::new(2));
    }

    #[test]
    fn color_flag() {
        let mut account = Account::with_login(None, &boards(), "rjennings");
        assert!(account.wants_color());

        account.set_flag(AccountFlag::ColorOff, true);
        assert!(!account.wants_color());
        assert_eq!(account.flags.to_names(hearth_types::ACCOUNT_FLAGS), "coloroff");

        account.set_flag(AccountFlag::ColorOff, false);
        assert!(account.wants_color());
    }

    #[test]
    fn flags_by_name() {
        let mut account = Account::with_login(None, &boards(), "rjennings");

        assert!(account.set_flag_by_name("ColorOff", true).unwrap());
        assert!(!account.set_flag_by_name("coloroff", true).unwrap());
        assert!(!account.wants_color());
        assert!(account.set_flag_by_name("coloroff", false).unwrap());

        let err = account.set_flag_by_name("blink", true).unwrap_err();
        assert!(matches!(
            err,
            AccountError::InvalidFlag(FlagError::Unknown(ref n)) if n == "blink"
        ));
        assert!(account.flags.is_empty());
    }

    #[test]
    fn detach_drops_session_references() {
        let mut account = Account::with_login(None, &boards(), "rjennings");
        account.attach(ConnectionId::new());
        account.playing = Some(CharacterId::new(3));

        account.detach();
        assert_eq!(account.connection(), None);
        assert_eq!(account.playing, None);
    }
}
