//! Crawl state definitions
//!
//! A run is a forward-only walk over listing pages. Each page moves through
//! `Fetching → Extracting → Filtering → PersistingBatch → Paginating` and then
//! either back to `Fetching` for the next page or to `Terminated`.

use crate::dates::PageDateHints;
use crate::extract::ListingPage;
use crate::filter::MatchedPost;
use crate::state::CrawlContext;
use std::fmt;
use url::Url;

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationReason {
    /// The last page declared no "older posts" link
    NoNextPage,

    /// The next-page link pointed back at the current page
    PaginationLoop,

    /// The configured (or default incremental) page cap was reached
    MaxPagesReached,

    /// Incremental run saw consecutive pages with nothing new
    NoNewContent,

    /// A page after the first could not be fetched
    FetchFailed,

    /// Cancelled from outside between pages
    Cancelled,
}

impl TerminationReason {
    /// Converts the reason to the tag stored on run records
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::NoNextPage => "no_next_page",
            Self::PaginationLoop => "pagination_loop",
            Self::MaxPagesReached => "max_pages_reached",
            Self::NoNewContent => "no_new_content",
            Self::FetchFailed => "fetch_failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a reason from its stored tag
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "no_next_page" => Some(Self::NoNextPage),
            "pagination_loop" => Some(Self::PaginationLoop),
            "max_pages_reached" => Some(Self::MaxPagesReached),
            "no_new_content" => Some(Self::NoNewContent),
            "fetch_failed" => Some(Self::FetchFailed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// The page-level states of a run
#[derive(Debug)]
pub enum CrawlState {
    /// About to request a listing page
    Fetching { url: Url },

    /// Body received, waiting to be parsed into candidates
    Extracting { url: Url, body: String },

    /// Candidates parsed, waiting for the keyword filter
    Filtering { url: Url, page: ListingPage },

    /// Keyword matches waiting for dedup-check and insert
    PersistingBatch {
        url: Url,
        matches: Vec<MatchedPost>,
        page_hints: PageDateHints,
        next: Option<Url>,
    },

    /// Page finished; decide whether and where to continue
    Paginating { current: Url, next: Option<Url> },

    /// Run is over
    Terminated(TerminationReason),
}

impl CrawlState {
    /// Short name used in trace output
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fetching { .. } => "fetching",
            Self::Extracting { .. } => "extracting",
            Self::Filtering { .. } => "filtering",
            Self::PersistingBatch { .. } => "persisting",
            Self::Paginating { .. } => "paginating",
            Self::Terminated(_) => "terminated",
        }
    }

    /// Returns true once the run has stopped
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated(_))
    }

    /// Transition out of `Paginating`
    ///
    /// Stop heuristics are checked before the link itself: an incremental run
    /// that has gone stale stops even if older pages exist, and the page cap
    /// wins over any link. A link equal to the current page is never followed.
    pub fn paginate(ctx: &CrawlContext, current: &Url, next: Option<Url>) -> CrawlState {
        if let Some(reason) = ctx.stop_reason() {
            return CrawlState::Terminated(reason);
        }

        match next {
            None => CrawlState::Terminated(TerminationReason::NoNextPage),
            Some(next) if same_page(&next, current) => {
                CrawlState::Terminated(TerminationReason::PaginationLoop)
            }
            Some(next) => CrawlState::Fetching { url: next },
        }
    }
}

fn same_page(a: &Url, b: &Url) -> bool {
    let mut a = a.clone();
    let mut b = b.clone();
    a.set_fragment(None);
    b.set_fragment(None);
    a == b
}
