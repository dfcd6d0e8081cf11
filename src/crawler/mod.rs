//! Crawler module for fetching and processing listing pages
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with error classification
//! - Inter-request politeness pacing
//! - The page-by-page crawl controller

mod controller;
mod fetcher;
mod pacer;

pub use controller::{Controller, RunSummary, EXTERNAL_RUN_ID_VAR};
pub use fetcher::{build_http_client, fetch_page, FetchError, FetchedPage};
pub use pacer::Pacer;

use crate::config::Config;
use crate::Result;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the storage layer
/// 2. Build the HTTP client and extractor
/// 3. Walk listing pages until a stop condition
/// 4. Record the run in the run ledger
pub async fn crawl(
    config: Config,
    config_hash: String,
    cancel: &CancellationToken,
) -> Result<RunSummary> {
    let mut controller = Controller::new(config, config_hash)?;
    controller.run(cancel).await
}
