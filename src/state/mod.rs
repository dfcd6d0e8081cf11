//! State module for tracking crawl progress
//!
//! A run is modelled as an explicit state machine over listing pages.
//!
//! # Components
//!
//! - `CrawlState`: the page-level states a run moves through
//! - `TerminationReason`: why a run stopped
//! - `CrawlContext`: running totals threaded through every transition
//! - `CrawlMode`: historical vs. incremental behaviour

mod context;
mod crawl_state;
mod mode;

// Re-export main types
pub use context::CrawlContext;
pub use crawl_state::{CrawlState, TerminationReason};
pub use mode::CrawlMode;
