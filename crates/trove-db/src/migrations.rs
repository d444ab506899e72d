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
        info!("Running migration v1 (initial schema)");
        // Reference columns hold JSON arrays of ids. No foreign keys: documents
        // reference each other by id only and may dangle after a delete.
        conn.execute_batch(
            "
            CREATE TABLE users (
                id                TEXT PRIMARY KEY,
                username          TEXT NOT NULL UNIQUE,
                email             TEXT NOT NULL UNIQUE,
                password          TEXT NOT NULL,
                image_url         TEXT,
                header_image_url  TEXT,
                userbio           TEXT,
                pronouns          TEXT,
                categories        TEXT NOT NULL DEFAULT '[]',
                collections       TEXT NOT NULL DEFAULT '[]',
                followers         TEXT NOT NULL DEFAULT '[]',
                following         TEXT NOT NULL DEFAULT '[]',
                version           INTEGER NOT NULL DEFAULT 0,
                created_at        TEXT NOT NULL,
                updated_at        TEXT NOT NULL
            );

            CREATE TABLE categories (
                id        TEXT PRIMARY KEY,
                category  TEXT NOT NULL UNIQUE
            );

            CREATE TABLE collections (
                id           TEXT PRIMARY KEY,
                name         TEXT NOT NULL,
                description  TEXT,
                created_by   TEXT,
                items        TEXT NOT NULL DEFAULT '[]',
                created_at   TEXT NOT NULL,
                updated_at   TEXT NOT NULL
            );

            CREATE TABLE items (
                id           TEXT PRIMARY KEY,
                name         TEXT NOT NULL UNIQUE,
                description  TEXT,
                image        TEXT NOT NULL DEFAULT 'No image',
                categories   TEXT NOT NULL DEFAULT '[]',
                collections  TEXT NOT NULL DEFAULT '[]',
                users        TEXT NOT NULL DEFAULT '[]',
                likes        TEXT NOT NULL DEFAULT '[]',
                reviews      TEXT NOT NULL DEFAULT '[]',
                created_at   TEXT NOT NULL,
                updated_at   TEXT NOT NULL
            );

            CREATE TABLE reviews (
                id          TEXT PRIMARY KEY,
                item_id     TEXT NOT NULL,
                author_id   TEXT NOT NULL,
                rating      INTEGER NOT NULL,
                comment     TEXT,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_reviews_item ON reviews(item_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
