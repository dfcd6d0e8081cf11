//! Topic-Harvester main entry point
//!
//! This is the command-line interface for the keyword-driven blog archiver.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use topic_harvester::config::{load_config_with_hash, validate, Config};
use topic_harvester::crawler::crawl;
use topic_harvester::output::{load_statistics, print_statistics};
use topic_harvester::storage::SqliteStorage;
use topic_harvester::CrawlMode;
use tracing_subscriber::EnvFilter;

/// Topic-Harvester: an incremental, keyword-driven blog archiver
///
/// Walks a paginated blog from its front page, keeps posts mentioning any
/// configured keyword, and stores each one exactly once in SQLite.
#[derive(Parser, Debug)]
#[command(name = "topic-harvester")]
#[command(version)]
#[command(about = "An incremental, keyword-driven blog archiver", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the crawl mode from the config file
    #[arg(long, value_enum)]
    mode: Option<CrawlMode>,

    /// Override the page cap from the config file
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Override the delay between requests (seconds)
    #[arg(long, value_name = "SECONDS")]
    delay: Option<f64>,

    /// Validate config and show the crawl plan without fetching anything
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid command-line override")?;

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("topic_harvester=info,warn"),
            1 => EnvFilter::new("topic_harvester=debug,info"),
            2 => EnvFilter::new("topic_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(mode) = cli.mode {
        config.crawler.mode = mode;
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = Some(max_pages);
    }
    if let Some(delay) = cli.delay {
        config.crawler.delay_seconds = delay;
    }
}

/// Handles the --dry-run mode: shows the effective crawl plan
fn handle_dry_run(config: &Config) {
    println!("=== Topic-Harvester Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Base URL: {}", config.crawler.base_url);
    println!("  Mode: {}", config.crawler.mode);
    match config.crawler.effective_max_pages() {
        Some(max) => println!("  Page cap: {}", max),
        None => println!("  Page cap: none"),
    }
    println!("  Delay between requests: {}s", config.crawler.delay_seconds);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Fetch full content: {}", config.crawler.fetch_full_content);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nKeywords ({}):", config.filter.keywords.len());
    println!("  {}", config.filter.keywords.join(", "));

    println!("\nPost Selectors ({}):", config.extractor.post_selectors.len());
    for selector in &config.extractor.post_selectors {
        println!("  - {}", selector);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: String) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    // Stop between pages on Ctrl-C; the run is still recorded
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing current page");
            on_signal.cancel();
        }
    });

    match crawl(config, config_hash, &cancel).await {
        Ok(summary) => {
            tracing::info!(
                "Crawl completed: {} pages, {} articles found, {} new ({})",
                summary.pages_visited,
                summary.articles_found,
                summary.new_articles,
                summary.stop_reason
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
