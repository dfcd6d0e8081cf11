//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the storage traits.

use crate::dates::Confidence;
use crate::state::{CrawlMode, TerminationReason};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{PostStore, RunLedger, StorageError, StorageResult};
use crate::storage::{PostRecord, RunRecord};
use crate::url::fingerprint_url;
use crate::HarvestError;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

/// How long a write waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

const POST_COLUMNS: &str = "url, url_fingerprint, title, content_excerpt, full_content,
    publish_date_raw, publish_date_resolved, date_source, date_confidence,
    matched_keyword, discovered_at, word_count, last_updated";

const RUN_COLUMNS: &str = "started_at, mode, pages_visited, articles_found, new_articles,
    page_errors, last_url, duration_seconds, stop_reason, config_hash, external_run_id";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    ///
    /// Failure here is fatal to a run: without a store nothing can be
    /// deduplicated.
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<PostRecord> {
    Ok(PostRecord {
        url: row.get(0)?,
        url_fingerprint: row.get(1)?,
        title: row.get(2)?,
        content_excerpt: row.get(3)?,
        full_content: row.get(4)?,
        publish_date_raw: row.get(5)?,
        publish_date_resolved: row.get(6)?,
        date_source: row.get(7)?,
        date_confidence: Confidence::from_db_string(&row.get::<_, String>(8)?)
            .unwrap_or(Confidence::Unknown),
        matched_keyword: row.get(9)?,
        discovered_at: row.get(10)?,
        word_count: row.get(11)?,
        last_updated: row.get(12)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        started_at: row.get(0)?,
        mode: CrawlMode::from_db_string(&row.get::<_, String>(1)?)
            .unwrap_or(CrawlMode::Incremental),
        pages_visited: row.get(2)?,
        articles_found: row.get(3)?,
        new_articles: row.get(4)?,
        page_errors: row.get(5)?,
        last_url: row.get(6)?,
        duration_seconds: row.get(7)?,
        stop_reason: row
            .get::<_, Option<String>>(8)?
            .as_deref()
            .and_then(TerminationReason::from_db_string),
        config_hash: row.get(9)?,
        external_run_id: row.get(10)?,
    })
}

/// Turns a unique-constraint failure into `Conflict`
fn map_insert_error(err: rusqlite::Error, url: &str) -> StorageError {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            StorageError::Conflict(url.to_string())
        }
        other => StorageError::Sqlite(other),
    }
}

fn exists_in(conn: &Connection, url: &str, fingerprint: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM articles WHERE url = ?1 OR url_fingerprint = ?2)",
        params![url, fingerprint],
        |row| row.get(0),
    )
}

impl PostStore for SqliteStorage {
    fn exists(&self, url: &str) -> StorageResult<bool> {
        Ok(exists_in(&self.conn, url, &fingerprint_url(url))?)
    }

    fn insert_post(&mut self, post: &PostRecord) -> StorageResult<bool> {
        // IMMEDIATE takes the write lock up front so check-then-insert is atomic
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if exists_in(&tx, &post.url, &post.url_fingerprint)? {
            return Ok(false);
        }

        tx.execute(
            &format!(
                "INSERT INTO articles ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                POST_COLUMNS
            ),
            params![
                post.url,
                post.url_fingerprint,
                post.title,
                post.content_excerpt,
                post.full_content,
                post.publish_date_raw,
                post.publish_date_resolved,
                post.date_source,
                post.date_confidence.to_db_string(),
                post.matched_keyword,
                post.discovered_at,
                post.word_count,
                post.last_updated,
            ],
        )
        .map_err(|e| map_insert_error(e, &post.url))?;

        tx.commit()?;
        Ok(true)
    }

    fn all_posts(&self) -> StorageResult<Vec<PostRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM articles
             ORDER BY publish_date_resolved DESC, discovered_at DESC",
            POST_COLUMNS
        ))?;

        let posts = stmt
            .query_map([], post_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    fn count_posts(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_by_keyword(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT matched_keyword, COUNT(*) AS n FROM articles
             GROUP BY matched_keyword ORDER BY n DESC, matched_keyword",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn count_by_confidence(&self) -> StorageResult<Vec<(Confidence, u64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT date_confidence, COUNT(*) FROM articles GROUP BY date_confidence")?;

        let mut counts = Vec::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        for row in rows {
            let (confidence, count) = row?;
            if let Some(confidence) = Confidence::from_db_string(&confidence) {
                counts.push((confidence, count as u64));
            }
        }

        counts.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(counts)
    }
}

impl RunLedger for SqliteStorage {
    fn record_run(&mut self, run: &RunRecord) -> StorageResult<i64> {
        self.conn.execute(
            &format!(
                "INSERT INTO runs ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                RUN_COLUMNS
            ),
            params![
                run.started_at,
                run.mode.to_db_string(),
                run.pages_visited,
                run.articles_found,
                run.new_articles,
                run.page_errors,
                run.last_url,
                run.duration_seconds,
                run.stop_reason.map(|r| r.to_db_string()),
                run.config_hash,
                run.external_run_id,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn count_runs(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
