use crate::state::{CrawlMode, TerminationReason};
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use url::Url;

/// Number of consecutive pages without new posts that ends an incremental run
pub const STALE_PAGE_LIMIT: u32 = 2;

/// Running totals for one crawl, threaded through every state transition
#[derive(Debug, Clone)]
pub struct CrawlContext {
    pub mode: CrawlMode,

    /// Page cap in effect, `None` meaning unbounded
    pub max_pages: Option<u32>,

    /// Listing pages whose fetch was attempted
    pub pages_visited: u32,

    /// Keyword-matched candidates, new or already stored
    pub articles_found: u32,

    /// Posts actually inserted during this run
    pub new_articles: u32,

    /// Non-fatal page failures (mid-run fetches, store errors)
    pub page_errors: u32,

    /// Pages in a row that produced no new posts
    pub consecutive_stale_pages: u32,

    /// Last listing page the run reached
    pub last_url: Option<String>,

    pub started_at: DateTime<Utc>,
    started: Instant,
}

impl CrawlContext {
    pub fn new(mode: CrawlMode, max_pages: Option<u32>) -> Self {
        Self {
            mode,
            max_pages,
            pages_visited: 0,
            articles_found: 0,
            new_articles: 0,
            page_errors: 0,
            consecutive_stale_pages: 0,
            last_url: None,
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    /// Marks the start of a page fetch
    pub fn begin_page(&mut self, url: &Url) {
        self.pages_visited += 1;
        self.last_url = Some(url.to_string());
    }

    /// True while the first page of the run is being processed
    pub fn on_first_page(&self) -> bool {
        self.pages_visited <= 1
    }

    /// Counts one keyword match and whether it was inserted
    pub fn record_match(&mut self, inserted: bool) {
        self.articles_found += 1;
        if inserted {
            self.new_articles += 1;
        }
    }

    pub fn record_page_error(&mut self) {
        self.page_errors += 1;
    }

    /// Closes out a page given how many posts it added
    pub fn finish_page(&mut self, new_on_page: u32) {
        if new_on_page == 0 {
            self.consecutive_stale_pages += 1;
        } else {
            self.consecutive_stale_pages = 0;
        }
    }

    /// Stop heuristic evaluated after each completed page
    pub fn stop_reason(&self) -> Option<TerminationReason> {
        if self.mode.stops_on_stale_pages() && self.consecutive_stale_pages >= STALE_PAGE_LIMIT {
            return Some(TerminationReason::NoNewContent);
        }

        match self.max_pages {
            Some(max) if self.pages_visited >= max => Some(TerminationReason::MaxPagesReached),
            _ => None,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
