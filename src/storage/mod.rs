//! Storage module for persisting harvested posts and run history
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - At-most-once post persistence keyed by URL and URL fingerprint
//! - The append-only run ledger

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{PostStore, RunLedger, StorageError, StorageResult};

use crate::dates::{Confidence, DateResolution};
use crate::extract::word_count;
use crate::state::{CrawlMode, TerminationReason};
use crate::url::fingerprint_url;
use crate::HarvestError;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, HarvestError> {
    SqliteStorage::new(path)
}

/// A stored post
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    /// Absolute URL as resolved from the listing page
    pub url: String,

    /// SHA-256 of the canonical form of `url`
    pub url_fingerprint: String,

    pub title: String,
    pub content_excerpt: String,
    pub full_content: String,
    pub publish_date_raw: Option<String>,
    pub publish_date_resolved: Option<NaiveDateTime>,
    pub date_source: String,
    pub date_confidence: Confidence,
    pub matched_keyword: String,
    pub discovered_at: DateTime<Utc>,

    /// Derived from `full_content`
    pub word_count: u32,

    pub last_updated: Option<DateTime<Utc>>,
}

impl PostRecord {
    /// Builds a record, deriving the fingerprint and word count
    pub fn new(
        url: &str,
        title: &str,
        content_excerpt: &str,
        full_content: String,
        date: DateResolution,
        matched_keyword: &str,
    ) -> Self {
        Self {
            url: url.to_string(),
            url_fingerprint: fingerprint_url(url),
            title: title.to_string(),
            content_excerpt: content_excerpt.to_string(),
            word_count: word_count(&full_content),
            full_content,
            publish_date_raw: date.raw,
            publish_date_resolved: date.parsed,
            date_source: date.source,
            date_confidence: date.confidence,
            matched_keyword: matched_keyword.to_string(),
            discovered_at: Utc::now(),
            last_updated: None,
        }
    }
}

/// One crawl invocation
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub started_at: DateTime<Utc>,
    pub mode: CrawlMode,
    pub pages_visited: u32,

    /// Keyword-matched candidates, new or already stored
    pub articles_found: u32,

    pub new_articles: u32,

    /// Non-fatal page failures
    pub page_errors: u32,

    pub last_url: Option<String>,
    pub duration_seconds: f64,
    pub stop_reason: Option<TerminationReason>,
    pub config_hash: String,

    /// CI run identifier, when launched from a workflow
    pub external_run_id: Option<String>,
}
