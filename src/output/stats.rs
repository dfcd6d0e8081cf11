//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! statistics about stored posts and the most recent run.

use crate::dates::Confidence;
use crate::storage::{PostStore, RunLedger, RunRecord};
use crate::Result;
use std::fmt::Write;

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Total number of stored posts
    pub total_posts: u64,

    /// Post counts per matched keyword, most frequent first
    pub posts_by_keyword: Vec<(String, u64)>,

    /// Post counts per date confidence, strongest first
    pub posts_by_confidence: Vec<(Confidence, u64)>,

    /// Number of recorded runs
    pub total_runs: u64,

    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from storage
pub fn load_statistics<S: PostStore + RunLedger>(storage: &S) -> Result<HarvestStatistics> {
    Ok(HarvestStatistics {
        total_posts: storage.count_posts()?,
        posts_by_keyword: storage.count_by_keyword()?,
        posts_by_confidence: storage.count_by_confidence()?,
        total_runs: storage.count_runs()?,
        latest_run: storage.latest_run()?,
    })
}

fn percentage(count: u64, total: u64) -> f64 {
    if total > 0 {
        (count as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Formats statistics for the terminal
pub fn render_statistics(stats: &HarvestStatistics) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "=== Harvest Statistics ===\n");
    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Stored posts: {}", stats.total_posts);
    let _ = writeln!(out, "  Recorded runs: {}", stats.total_runs);
    let _ = writeln!(out);

    if !stats.posts_by_keyword.is_empty() {
        let _ = writeln!(out, "Posts by Keyword:");
        for (keyword, count) in &stats.posts_by_keyword {
            let _ = writeln!(
                out,
                "  {}: {} ({:.1}%)",
                keyword,
                count,
                percentage(*count, stats.total_posts)
            );
        }
        let _ = writeln!(out);
    }

    if !stats.posts_by_confidence.is_empty() {
        let _ = writeln!(out, "Date Confidence:");
        for (confidence, count) in &stats.posts_by_confidence {
            let _ = writeln!(
                out,
                "  {}: {} ({:.1}%)",
                confidence,
                count,
                percentage(*count, stats.total_posts)
            );
        }
        let _ = writeln!(out);
    }

    match &stats.latest_run {
        Some(run) => {
            let _ = writeln!(out, "Latest Run:");
            let _ = writeln!(out, "  Started: {}", run.started_at.to_rfc3339());
            let _ = writeln!(out, "  Mode: {}", run.mode);
            let _ = writeln!(out, "  Pages visited: {}", run.pages_visited);
            let _ = writeln!(out, "  Articles found: {}", run.articles_found);
            let _ = writeln!(out, "  New articles: {}", run.new_articles);
            let _ = writeln!(out, "  Page errors: {}", run.page_errors);
            let _ = writeln!(out, "  Duration: {:.1}s", run.duration_seconds);
            if let Some(reason) = run.stop_reason {
                let _ = writeln!(out, "  Stopped: {}", reason);
            }
            if let Some(last_url) = &run.last_url {
                let _ = writeln!(out, "  Last URL: {}", last_url);
            }
        }
        None => {
            let _ = writeln!(out, "No runs recorded yet.");
        }
    }

    out
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &HarvestStatistics) {
    print!("{}", render_statistics(stats));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DateResolution;
    use crate::state::{CrawlMode, TerminationReason};
    use crate::storage::{PostRecord, SqliteStorage};
    use chrono::Utc;

    #[test]
    fn test_empty_database() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let stats = load_statistics(&storage).unwrap();

        assert_eq!(stats.total_posts, 0);
        assert!(stats.latest_run.is_none());
        assert!(render_statistics(&stats).contains("No runs recorded yet."));
    }

    #[test]
    fn test_statistics_from_storage() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        for (url, keyword) in [
            ("https://blog.example.com/a", "quran"),
            ("https://blog.example.com/b", "quran"),
            ("https://blog.example.com/c", "hajj"),
        ] {
            let post = PostRecord::new(
                url,
                "Title",
                "",
                String::new(),
                DateResolution::unknown(),
                keyword,
            );
            storage.insert_post(&post).unwrap();
        }
        storage
            .record_run(&RunRecord {
                started_at: Utc::now(),
                mode: CrawlMode::Historical,
                pages_visited: 4,
                articles_found: 3,
                new_articles: 3,
                page_errors: 1,
                last_url: None,
                duration_seconds: 12.0,
                stop_reason: Some(TerminationReason::FetchFailed),
                config_hash: "abc".to_string(),
                external_run_id: None,
            })
            .unwrap();

        let stats = load_statistics(&storage).unwrap();
        assert_eq!(stats.total_posts, 3);
        assert_eq!(stats.posts_by_keyword[0], ("quran".to_string(), 2));
        assert_eq!(stats.posts_by_confidence, vec![(Confidence::Unknown, 3)]);

        let rendered = render_statistics(&stats);
        assert!(rendered.contains("Stored posts: 3"));
        assert!(rendered.contains("quran: 2 (66.7%)"));
        assert!(rendered.contains("Stopped: fetch_failed"));
        assert!(rendered.contains("Mode: historical"));
    }
}
