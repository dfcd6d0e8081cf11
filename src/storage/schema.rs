//! Database schema definitions
//!
//! Articles are write-once (only `last_updated` may change) and runs are
//! append-only; both rules are enforced by triggers.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Matched posts, each stored at most once
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    url_fingerprint TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    content_excerpt TEXT NOT NULL DEFAULT '',
    full_content TEXT NOT NULL DEFAULT '',
    publish_date_raw TEXT,
    publish_date_resolved TEXT,
    date_source TEXT NOT NULL,
    date_confidence TEXT NOT NULL,
    matched_keyword TEXT NOT NULL,
    discovered_at TEXT NOT NULL,
    word_count INTEGER NOT NULL DEFAULT 0,
    last_updated TEXT
);

CREATE INDEX IF NOT EXISTS idx_articles_published
    ON articles(publish_date_resolved DESC, discovered_at DESC);
CREATE INDEX IF NOT EXISTS idx_articles_keyword ON articles(matched_keyword);

CREATE TRIGGER IF NOT EXISTS articles_immutable
BEFORE UPDATE OF url, url_fingerprint, title, content_excerpt, full_content,
    publish_date_raw, publish_date_resolved, date_source, date_confidence,
    matched_keyword, discovered_at, word_count ON articles
BEGIN
    SELECT RAISE(ABORT, 'articles are immutable');
END;

CREATE TRIGGER IF NOT EXISTS articles_no_delete
BEFORE DELETE ON articles
BEGIN
    SELECT RAISE(ABORT, 'articles are never deleted');
END;

-- One row per crawl invocation
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    mode TEXT NOT NULL,
    pages_visited INTEGER NOT NULL,
    articles_found INTEGER NOT NULL,
    new_articles INTEGER NOT NULL,
    page_errors INTEGER NOT NULL DEFAULT 0,
    last_url TEXT,
    duration_seconds REAL NOT NULL,
    stop_reason TEXT,
    config_hash TEXT NOT NULL,
    external_run_id TEXT
);

CREATE TRIGGER IF NOT EXISTS runs_append_only_update
BEFORE UPDATE ON runs
BEGIN
    SELECT RAISE(ABORT, 'runs are append-only');
END;

CREATE TRIGGER IF NOT EXISTS runs_append_only_delete
BEFORE DELETE ON runs
BEGIN
    SELECT RAISE(ABORT, 'runs are append-only');
END;
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn insert_article(conn: &Connection) {
        conn.execute(
            "INSERT INTO articles (url, url_fingerprint, title, date_source, date_confidence,
             matched_keyword, discovered_at) VALUES ('u', 'f', 't', 'unknown', 'unknown', 'k', 'now')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["articles", "runs"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_articles_are_immutable() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        insert_article(&conn);

        assert!(conn.execute("UPDATE articles SET title = 'x'", []).is_err());
        assert!(conn.execute("DELETE FROM articles", []).is_err());
        assert!(conn
            .execute("UPDATE articles SET last_updated = 'later'", [])
            .is_ok());
    }

    #[test]
    fn test_unique_fingerprint() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        insert_article(&conn);

        let dup = conn.execute(
            "INSERT INTO articles (url, url_fingerprint, title, date_source, date_confidence,
             matched_keyword, discovered_at) VALUES ('other', 'f', 't', 'unknown', 'unknown', 'k', 'now')",
            [],
        );
        assert!(dup.is_err());
    }
}
