use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (users, ads, exchange proposals)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE ads (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id      TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title        TEXT NOT NULL,
                description  TEXT NOT NULL,
                image_url    TEXT,
                category     TEXT NOT NULL CHECK (category IN ('E', 'C', 'F', 'B', 'O')),
                condition    TEXT NOT NULL CHECK (condition IN ('N', 'U')),
                created_at   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE INDEX idx_ads_created ON ads(created_at DESC, id DESC);
            CREATE INDEX idx_ads_user ON ads(user_id);

            CREATE TABLE exchange_proposals (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                ad_sender_id    INTEGER NOT NULL REFERENCES ads(id) ON DELETE CASCADE,
                ad_receiver_id  INTEGER NOT NULL REFERENCES ads(id) ON DELETE CASCADE,
                comment         TEXT,
                status          TEXT NOT NULL DEFAULT 'P' CHECK (status IN ('P', 'A', 'R')),
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                updated_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE INDEX idx_proposals_receiver ON exchange_proposals(ad_receiver_id, status);
            CREATE INDEX idx_proposals_sender ON exchange_proposals(ad_sender_id);
            CREATE INDEX idx_proposals_user ON exchange_proposals(user_id);
            CREATE UNIQUE INDEX idx_proposals_pending_pair
                ON exchange_proposals(ad_sender_id, ad_receiver_id) WHERE status = 'P';

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, 1);
    }
}
