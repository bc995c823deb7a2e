use rusqlite::{Connection, TransactionBehavior};
use tracing::info;

use crate::Result;

/// Bring the schema up to date. The version check and the migrations share an
/// immediate transaction, so concurrent openers of a fresh file apply each
/// step exactly once.
pub fn run(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = tx.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (accounts)");
        tx.execute_batch(
            "
            CREATE TABLE account (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                login           TEXT NOT NULL UNIQUE,
                email           TEXT NOT NULL DEFAULT '',
                password        TEXT NOT NULL DEFAULT '',
                timezone        INTEGER NOT NULL DEFAULT 0,
                autologin_id    INTEGER,
                flags           INTEGER NOT NULL DEFAULT 0,
                forum_id        INTEGER NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE account_player (
                account_id  INTEGER NOT NULL REFERENCES account(id) ON DELETE CASCADE,
                char_id     INTEGER NOT NULL,
                name        TEXT NOT NULL,
                level       INTEGER NOT NULL DEFAULT 1,
                PRIMARY KEY (account_id, char_id)
            );

            CREATE TABLE account_forum (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id      INTEGER NOT NULL REFERENCES account(id) ON DELETE CASCADE,
                forum_id        INTEGER NOT NULL,
                last_note       INTEGER NOT NULL DEFAULT 0,
                unsubscribed    INTEGER NOT NULL DEFAULT 0,
                draft           TEXT,
                UNIQUE(account_id, forum_id)
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    tx.commit()?;
    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn migrations_are_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        run(&mut conn).unwrap();
        run(&mut conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[test]
    fn concurrent_openers_migrate_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hearth.db");
        let barrier = Arc::new(Barrier::new(4));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let path = path.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let mut conn = Connection::open(&path).unwrap();
                    conn.busy_timeout(std::time::Duration::from_secs(5)).unwrap();
                    barrier.wait();
                    run(&mut conn).map_err(|e| e.to_string())
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let conn = Connection::open(&path).unwrap();
        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }
}
