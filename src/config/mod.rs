//! Configuration module for Topic-Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use topic_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawling from: {}", config.crawler.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_keywords, default_next_page_selectors, default_post_selectors, Config, CrawlerConfig,
    ExtractorConfig, FilterConfig, OutputConfig, UserAgentConfig, DEFAULT_INCREMENTAL_MAX_PAGES,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, MAX_DELAY_SECONDS};
