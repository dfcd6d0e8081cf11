//! Crawl controller
//!
//! Drives one run as an explicit state machine over listing pages. All
//! mutable run state lives in a `CrawlContext` threaded through the
//! transitions; the controller itself only owns collaborators.

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, fetch_page};
use crate::crawler::pacer::Pacer;
use crate::dates::{DateResolver, PageDateHints};
use crate::extract::{article_text, PostExtractor};
use crate::filter::{MatchedPost, RelevanceFilter};
use crate::state::{CrawlContext, CrawlMode, CrawlState, TerminationReason};
use crate::storage::{
    open_storage, PostRecord, PostStore, RunLedger, RunRecord, SqliteStorage, StorageResult,
};
use crate::{HarvestError, Result};
use reqwest::Client;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Environment variable carrying the CI run identifier
pub const EXTERNAL_RUN_ID_VAR: &str = "GITHUB_RUN_ID";

/// Outcome of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Ledger ID of the recorded run
    pub run_id: i64,
    pub mode: CrawlMode,
    pub pages_visited: u32,
    pub articles_found: u32,
    pub new_articles: u32,
    pub page_errors: u32,
    pub last_url: Option<String>,
    pub duration: Duration,
    pub stop_reason: TerminationReason,
}

/// Orchestrates fetch, extract, filter, dedup and persist across pages
pub struct Controller<S = SqliteStorage> {
    config: Config,
    config_hash: String,
    client: Client,
    storage: S,
    extractor: PostExtractor,
    filter: RelevanceFilter,
    resolver: DateResolver,
    pacer: Pacer,
}

impl Controller<SqliteStorage> {
    /// Creates a controller, opening the configured database
    ///
    /// Failing to open the store is fatal.
    pub fn new(config: Config, config_hash: String) -> Result<Self> {
        let storage = open_storage(Path::new(&config.output.database_path))?;
        Self::with_storage(config, config_hash, storage)
    }
}

impl<S: PostStore + RunLedger> Controller<S> {
    /// Creates a controller over an already-open store
    pub fn with_storage(config: Config, config_hash: String, storage: S) -> Result<Self> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.request_timeout_secs),
        )?;
        let extractor = PostExtractor::new(&config.extractor)?;
        let filter = RelevanceFilter::new(config.filter.keywords.iter().cloned());
        let pacer = Pacer::from_secs_f64(config.crawler.delay_seconds);

        Ok(Self {
            config,
            config_hash,
            client,
            storage,
            extractor,
            filter,
            resolver: DateResolver::new(),
            pacer,
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Runs one crawl to completion and appends it to the run ledger
    ///
    /// Only a failed first page or an unusable store make this return `Err`;
    /// every other failure is counted and the run still gets recorded.
    /// `cancel` is honoured between pages and during politeness pauses.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<RunSummary> {
        let base_url = Url::parse(&self.config.crawler.base_url)?;
        let mode = self.config.crawler.mode;
        let mut ctx = CrawlContext::new(mode, self.config.crawler.effective_max_pages());

        tracing::info!(
            "Starting {} crawl of {} (page cap: {})",
            mode,
            base_url,
            ctx.max_pages
                .map_or_else(|| "none".to_string(), |max| max.to_string())
        );

        let mut state = CrawlState::Fetching { url: base_url };
        let stop_reason = loop {
            tracing::trace!("Crawl state: {}", state.name());

            state = match state {
                CrawlState::Terminated(reason) => break reason,

                CrawlState::Fetching { url } => self.fetch_listing(&mut ctx, url, cancel).await?,

                CrawlState::Extracting { url, body } => {
                    let page = self.extractor.parse_listing(&body, &url);
                    CrawlState::Filtering { url, page }
                }

                CrawlState::Filtering { url, page } => {
                    let found = page.candidates.len();
                    let matches = self.filter.filter_page(page.candidates);
                    tracing::info!(
                        "Page {}: {} posts, {} matching keywords",
                        ctx.pages_visited,
                        found,
                        matches.len()
                    );
                    CrawlState::PersistingBatch {
                        url,
                        matches,
                        page_hints: page.page_hints,
                        next: page.next_page,
                    }
                }

                CrawlState::PersistingBatch {
                    url,
                    matches,
                    page_hints,
                    next,
                } => {
                    let new_on_page = self
                        .persist_batch(&mut ctx, &page_hints, matches, cancel)
                        .await;
                    ctx.finish_page(new_on_page);
                    CrawlState::Paginating { current: url, next }
                }

                CrawlState::Paginating { current, next } => {
                    CrawlState::paginate(&ctx, &current, next)
                }
            };
        };

        self.finish(ctx, stop_reason)
    }

    async fn fetch_listing(
        &mut self,
        ctx: &mut CrawlContext,
        url: Url,
        cancel: &CancellationToken,
    ) -> Result<CrawlState> {
        if cancel.is_cancelled() || !self.pacer.wait(cancel).await {
            tracing::info!("Crawl cancelled before {}", url);
            return Ok(CrawlState::Terminated(TerminationReason::Cancelled));
        }

        ctx.begin_page(&url);
        self.pacer.record_request(Instant::now());
        tracing::info!("Fetching page {}: {}", ctx.pages_visited, url);

        match fetch_page(&self.client, &url).await {
            Ok(page) => Ok(CrawlState::Extracting {
                url: page.final_url,
                body: page.body,
            }),
            Err(source) if ctx.on_first_page() => {
                tracing::error!("First page failed, aborting run: {}", source);
                Err(HarvestError::FirstPageFetch {
                    url: url.to_string(),
                    source,
                })
            }
            Err(e) => {
                tracing::warn!("Page fetch failed, stopping pagination: {}", e);
                ctx.record_page_error();
                Ok(CrawlState::Terminated(TerminationReason::FetchFailed))
            }
        }
    }

    /// Dedup-checks and stores each match, returning how many were new
    ///
    /// A store failure abandons the rest of the page.
    async fn persist_batch(
        &mut self,
        ctx: &mut CrawlContext,
        page_hints: &PageDateHints,
        matches: Vec<MatchedPost>,
        cancel: &CancellationToken,
    ) -> u32 {
        let mut new_on_page = 0;

        for matched in matches {
            match self.persist_one(page_hints, &matched, cancel).await {
                Ok(true) => {
                    ctx.record_match(true);
                    new_on_page += 1;
                    tracing::info!(
                        "NEW [{}]: {}",
                        matched.keyword,
                        matched.candidate.title
                    );
                }
                Ok(false) => {
                    ctx.record_match(false);
                    tracing::info!("EXISTS: {}", matched.candidate.url);
                }
                Err(e) => {
                    tracing::warn!(
                        "Storing {} failed, skipping rest of page: {}",
                        matched.candidate.url,
                        e
                    );
                    ctx.record_page_error();
                    break;
                }
            }
        }

        new_on_page
    }

    async fn persist_one(
        &mut self,
        page_hints: &PageDateHints,
        matched: &MatchedPost,
        cancel: &CancellationToken,
    ) -> StorageResult<bool> {
        let candidate = &matched.candidate;
        let url = candidate.url.as_str();

        if self.storage.exists(url)? {
            return Ok(false);
        }

        let date = self
            .resolver
            .resolve(page_hints, &candidate.date_hints, Some(url));
        tracing::debug!(
            "Date for {}: {:?} via {} ({})",
            url,
            date.parsed,
            date.source,
            date.confidence
        );

        // The listing block's own text stands in when the article page is
        // not fetched or yields nothing
        let full_content = if self.config.crawler.fetch_full_content {
            self.fetch_article(&candidate.url, cancel)
                .await
                .unwrap_or_else(|| candidate.content.clone())
        } else {
            candidate.content.clone()
        };

        let record = PostRecord::new(
            url,
            &candidate.title,
            &candidate.excerpt,
            full_content,
            date,
            &matched.keyword,
        );

        match self.storage.insert_post(&record) {
            Err(e) if e.is_conflict() => {
                tracing::debug!("Insert raced with another writer: {}", e);
                Ok(false)
            }
            other => other,
        }
    }

    /// Fetches a post's own page for its full text; `None` keeps the listing text
    async fn fetch_article(&mut self, url: &Url, cancel: &CancellationToken) -> Option<String> {
        if !self.pacer.wait(cancel).await {
            return None;
        }
        self.pacer.record_request(Instant::now());

        match fetch_page(&self.client, url).await {
            Ok(page) => {
                let text = article_text(&page.body);
                if text.is_none() {
                    tracing::debug!("No article container on {}", url);
                }
                text
            }
            Err(e) => {
                tracing::warn!("Could not fetch full article: {}", e);
                None
            }
        }
    }

    fn finish(&mut self, ctx: CrawlContext, stop_reason: TerminationReason) -> Result<RunSummary> {
        let duration = ctx.elapsed();
        let record = RunRecord {
            started_at: ctx.started_at,
            mode: ctx.mode,
            pages_visited: ctx.pages_visited,
            articles_found: ctx.articles_found,
            new_articles: ctx.new_articles,
            page_errors: ctx.page_errors,
            last_url: ctx.last_url.clone(),
            duration_seconds: duration.as_secs_f64(),
            stop_reason: Some(stop_reason),
            config_hash: self.config_hash.clone(),
            external_run_id: std::env::var(EXTERNAL_RUN_ID_VAR).ok(),
        };
        let run_id = self.storage.record_run(&record)?;

        tracing::info!(
            "Run {} finished ({}): {} pages, {} found, {} new, {} page errors in {:.1}s",
            run_id,
            stop_reason,
            ctx.pages_visited,
            ctx.articles_found,
            ctx.new_articles,
            ctx.page_errors,
            duration.as_secs_f64()
        );

        Ok(RunSummary {
            run_id,
            mode: ctx.mode,
            pages_visited: ctx.pages_visited,
            articles_found: ctx.articles_found,
            new_articles: ctx.new_articles,
            page_errors: ctx.page_errors,
            last_url: ctx.last_url,
            duration,
            stop_reason,
        })
    }
}
