use crate::models::{AccountForumRow, AccountPlayerRow, AccountRow, NewAccountRow};
use crate::{Database, Result, StoreError};
use rusqlite::{Connection, Row, params};
use tracing::debug;

const ACCOUNT_COLUMNS: &str =
    "id, login, email, password, timezone, autologin_id, flags, forum_id";

impl Database {
    // -- Accounts --

    pub fn get_account_by_login(&self, login: &str) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| query_account(conn, "login = ?1", login))
    }

    pub fn get_account_by_id(&self, id: i64) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| query_account(conn, "id = ?1", id))
    }

    pub fn list_accounts(&self) -> Result<Vec<AccountRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {ACCOUNT_COLUMNS} FROM account ORDER BY id"))?;
            let rows = stmt
                .query_map([], account_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Insert a new account record and return its assigned id.
    /// A taken login is reported as [`StoreError::Constraint`].
    pub fn create_account(&self, account: &NewAccountRow<'_>) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO account
                     (login, email, password, timezone, autologin_id, flags, forum_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    account.login,
                    account.email,
                    account.password,
                    account.timezone,
                    account.autologin_id,
                    account.flags,
                    account.forum_id,
                ],
            )?;
            let id = conn.last_insert_rowid();
            debug!("Created account {} ({})", account.login, id);
            Ok(id)
        })
    }

    /// Overwrite the identity fields of an existing account record.
    pub fn update_account(&self, account: &AccountRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE account
                 SET login = ?2, email = ?3, password = ?4, timezone = ?5,
                     autologin_id = ?6, flags = ?7, forum_id = ?8
                 WHERE id = ?1",
                params![
                    account.id,
                    account.login,
                    account.email,
                    account.password,
                    account.timezone,
                    account.autologin_id,
                    account.flags,
                    account.forum_id,
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(format!("account {}", account.id)));
            }
            Ok(())
        })
    }

    /// Remove an account together with its roster and board state.
    pub fn delete_account(&self, id: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let players = tx.execute("DELETE FROM account_player WHERE account_id = ?1", [id])?;
            let forums = tx.execute("DELETE FROM account_forum WHERE account_id = ?1", [id])?;
            let accounts = tx.execute("DELETE FROM account WHERE id = ?1", [id])?;

            if accounts == 0 {
                // Dropping the transaction rolls it back.
                return Err(StoreError::NotFound(format!("account {id}")));
            }

            tx.commit()?;
            debug!(
                "Deleted account {} ({} players, {} forum records)",
                id, players, forums
            );
            Ok(())
        })
    }

    // -- Roster --

    /// All roster rows for an account, in the order they were linked.
    pub fn get_account_players(&self, account_id: i64) -> Result<Vec<AccountPlayerRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT account_id, char_id, name, level FROM account_player
                 WHERE account_id = ?1
                 ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([account_id], |row| {
                    Ok(AccountPlayerRow {
                        account_id: row.get(0)?,
                        char_id: row.get(1)?,
                        name: row.get(2)?,
                        level: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Link a character to an account, refreshing name and level if it is
    /// already linked. Existing links keep their position in the roster.
    pub fn upsert_account_player(&self, player: &AccountPlayerRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO account_player (account_id, char_id, name, level)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(account_id, char_id) DO UPDATE
                 SET name = excluded.name, level = excluded.level",
                params![player.account_id, player.char_id, player.name, player.level],
            )?;
            Ok(())
        })
    }

    pub fn delete_account_player(&self, account_id: i64, char_id: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "DELETE FROM account_player WHERE account_id = ?1 AND char_id = ?2",
                [account_id, char_id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(format!(
                    "character {char_id} on account {account_id}"
                )));
            }
            Ok(())
        })
    }

    // -- Board state --

    pub fn get_account_forums(&self, account_id: i64) -> Result<Vec<AccountForumRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, account_id, forum_id, last_note, unsubscribed, draft
                 FROM account_forum
                 WHERE account_id = ?1
                 ORDER BY id",
            )?;
            let rows = stmt
                .query_map([account_id], |row| {
                    Ok(AccountForumRow {
                        id: row.get(0)?,
                        account_id: row.get(1)?,
                        forum_id: row.get(2)?,
                        last_note: row.get(3)?,
                        unsubscribed: row.get(4)?,
                        draft: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Write board state rows in one transaction. Rows are matched on
    /// (account, board); returns the record id of each row, in input order.
    pub fn save_account_forums(&self, rows: &[AccountForumRow]) -> Result<Vec<i64>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut ids = Vec::with_capacity(rows.len());
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO account_forum
                         (account_id, forum_id, last_note, unsubscribed, draft)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(account_id, forum_id) DO UPDATE
                     SET last_note = excluded.last_note,
                         unsubscribed = excluded.unsubscribed,
                         draft = excluded.draft
                     RETURNING id",
                )?;
                for row in rows {
                    let id: i64 = stmt
                        .query_row(
                            params![
                                row.account_id,
                                row.forum_id,
                                row.last_note,
                                row.unsubscribed,
                                row.draft,
                            ],
                            |r| r.get(0),
                        )?;
                    ids.push(id);
                }
            }
            tx.commit()?;
            Ok(ids)
        })
    }
}

fn query_account<P: rusqlite::ToSql>(
    conn: &Connection,
    filter: &str,
    value: P,
) -> Result<Option<AccountRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM account WHERE {filter}"
    ))?;

    let row = stmt.query_row([value], account_from_row).optional()?;

    Ok(row)
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<AccountRow> {
    Ok(AccountRow {
        id: row.get(0)?,
        login: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        timezone: row.get(4)?,
        autologin_id: row.get(5)?,
        flags: row.get(6)?,
        forum_id: row.get(7)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(login: &str) -> NewAccountRow<'_> {
        NewAccountRow {
            login,
            email: "someone@example.com",
            password: "x8Jd0aKq",
            timezone: -5,
            autologin_id: None,
            flags: 0,
            forum_id: 1,
        }
    }

    fn player(account_id: i64, char_id: i64, name: &str) -> AccountPlayerRow {
        AccountPlayerRow {
            account_id,
            char_id,
            name: name.into(),
            level: 1,
        }
    }

    #[test]
    fn create_and_fetch_account() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_account(&new_account("rjennings")).unwrap();

        let row = db.get_account_by_login("rjennings").unwrap().unwrap();
        assert_eq!(row.id, id);
        assert_eq!(row.timezone, -5);
        assert_eq!(db.get_account_by_id(id).unwrap(), Some(row));
        assert!(db.get_account_by_login("nobody").unwrap().is_none());
    }

    #[test]
    fn duplicate_login_is_a_constraint_violation() {
        let db = Database::open_in_memory().unwrap();
        db.create_account(&new_account("rjennings")).unwrap();

        let err = db.create_account(&new_account("rjennings")).unwrap_err();
        assert!(err.is_constraint(), "unexpected error: {err}");
    }

    #[test]
    fn update_missing_account_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_account(&new_account("rjennings")).unwrap();
        let mut row = db.get_account_by_id(id).unwrap().unwrap();

        row.email = "new@example.com".into();
        db.update_account(&row).unwrap();
        assert_eq!(
            db.get_account_by_id(id).unwrap().unwrap().email,
            "new@example.com"
        );

        row.id += 100;
        assert!(db.update_account(&row).unwrap_err().is_not_found());
    }

    #[test]
    fn delete_cascades_and_is_not_found_twice() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_account(&new_account("rjennings")).unwrap();
        db.upsert_account_player(&player(id, 10, "Aldo")).unwrap();
        db.save_account_forums(&[AccountForumRow {
            id: None,
            account_id: id,
            forum_id: 1,
            last_note: 1_000,
            unsubscribed: false,
            draft: None,
        }])
        .unwrap();

        db.delete_account(id).unwrap();
        assert!(db.get_account_players(id).unwrap().is_empty());
        assert!(db.get_account_forums(id).unwrap().is_empty());
        assert!(db.delete_account(id).unwrap_err().is_not_found());
    }

    #[test]
    fn roster_keeps_link_order_across_updates() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_account(&new_account("rjennings")).unwrap();
        db.upsert_account_player(&player(id, 30, "Cora")).unwrap();
        db.upsert_account_player(&player(id, 10, "Aldo")).unwrap();
        db.upsert_account_player(&AccountPlayerRow {
            level: 12,
            ..player(id, 30, "Cora")
        })
        .unwrap();

        let roster = db.get_account_players(id).unwrap();
        let ids: Vec<i64> = roster.iter().map(|p| p.char_id).collect();
        assert_eq!(ids, vec![30, 10]);
        assert_eq!(roster[0].level, 12);

        db.delete_account_player(id, 30).unwrap();
        assert!(db.delete_account_player(id, 30).unwrap_err().is_not_found());
        assert_eq!(db.get_account_players(id).unwrap().len(), 1);
    }

    #[test]
    fn roster_rows_require_an_account() {
        let db = Database::open_in_memory().unwrap();
        let err = db.upsert_account_player(&player(99, 1, "Ghost")).unwrap_err();
        assert!(err.is_constraint(), "unexpected error: {err}");
    }

    #[test]
    fn forum_rows_upsert_by_board() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_account(&new_account("rjennings")).unwrap();
        let mut row = AccountForumRow {
            id: None,
            account_id: id,
            forum_id: 2,
            last_note: 50,
            unsubscribed: false,
            draft: Some("half a reply".into()),
        };

        let first = db.save_account_forums(std::slice::from_ref(&row)).unwrap();
        row.last_note = 75;
        row.unsubscribed = true;
        row.draft = None;
        let second = db.save_account_forums(std::slice::from_ref(&row)).unwrap();
        assert_eq!(first, second);

        let stored = db.get_account_forums(id).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, Some(first[0]));
        assert_eq!(stored[0].last_note, 75);
        assert!(stored[0].unsubscribed);
        assert_eq!(stored[0].draft, None);
    }

    #[test]
    fn separate_handles_share_login_uniqueness() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hearth.db");
        let a = Database::open(&path).unwrap();
        let b = Database::open(&path).unwrap();

        a.create_account(&new_account("rjennings")).unwrap();
        assert!(b.create_account(&new_account("rjennings")).unwrap_err().is_constraint());
        assert!(b.get_account_by_login("rjennings").unwrap().is_some());
    }
}
