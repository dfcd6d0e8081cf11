//! Storage traits and error types

use crate::dates::Confidence;
use crate::storage::{PostRecord, RunRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// A unique constraint fired on insert; the post is already stored
    #[error("Post already exists: {0}")]
    Conflict(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StorageError {
    /// Conflicts are a successful dedup, not a failure
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable at-most-once store of matched posts
pub trait PostStore {
    /// Checks both the URL as given and its fingerprint
    fn exists(&self, url: &str) -> StorageResult<bool>;

    /// Inserts a post atomically
    ///
    /// Returns `Ok(false)` if the URL or its fingerprint is already stored and
    /// `Err(StorageError::Conflict)` if a concurrent writer won the race.
    fn insert_post(&mut self, post: &PostRecord) -> StorageResult<bool>;

    /// All posts, newest publication date first, then newest discovery
    fn all_posts(&self) -> StorageResult<Vec<PostRecord>>;

    fn count_posts(&self) -> StorageResult<u64>;

    /// Post counts per matched keyword, most frequent first
    fn count_by_keyword(&self) -> StorageResult<Vec<(String, u64)>>;

    /// Post counts per date confidence, strongest first
    fn count_by_confidence(&self) -> StorageResult<Vec<(Confidence, u64)>>;
}

/// Append-only log of crawl invocations
pub trait RunLedger {
    /// Appends a run and returns its ID
    fn record_run(&mut self, run: &RunRecord) -> StorageResult<i64>;

    fn latest_run(&self) -> StorageResult<Option<RunRecord>>;

    fn count_runs(&self) -> StorageResult<u64>;
}
