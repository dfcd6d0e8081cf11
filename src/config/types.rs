use crate::state::CrawlMode;
use serde::Deserialize;

/// Main configuration structure for Topic-Harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// First listing page of the blog
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Historical crawls walk the whole archive, incremental ones stop early
    #[serde(default)]
    pub mode: CrawlMode,

    /// Optional cap on the number of listing pages visited
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<u32>,

    /// Pause between consecutive requests to the origin (seconds)
    #[serde(rename = "delay-seconds", default = "default_delay_seconds")]
    pub delay_seconds: f64,

    /// Total timeout for a single HTTP request (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Fetch each new post's own page for its full text
    #[serde(rename = "fetch-full-content", default)]
    pub fetch_full_content: bool,
}

/// Page cap applied to incremental runs when none is configured
pub const DEFAULT_INCREMENTAL_MAX_PAGES: u32 = 5;

impl CrawlerConfig {
    /// Page cap in effect for this run, `None` meaning unbounded
    pub fn effective_max_pages(&self) -> Option<u32> {
        match (self.max_pages, self.mode) {
            (Some(max), _) => Some(max),
            (None, CrawlMode::Incremental) => Some(DEFAULT_INCREMENTAL_MAX_PAGES),
            (None, CrawlMode::Historical) => None,
        }
    }
}

fn default_delay_seconds() -> f64 {
    2.0
}

fn default_request_timeout() -> u64 {
    30
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Relevance filter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Ordered keyword list; the first one found is recorded on the post
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
        }
    }
}

/// Structural selectors used by the post extractor
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorConfig {
    /// Post container selectors, tried in order until one matches
    #[serde(rename = "post-selectors", default = "default_post_selectors")]
    pub post_selectors: Vec<String>,

    /// "Older posts" link selectors, tried in order
    #[serde(rename = "next-page-selectors", default = "default_next_page_selectors")]
    pub next_page_selectors: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            post_selectors: default_post_selectors(),
            next_page_selectors: default_next_page_selectors(),
        }
    }
}

pub fn default_post_selectors() -> Vec<String> {
    [
        "article",
        ".post",
        ".blog-post",
        ".entry",
        "[class*=\"post\"]",
        ".hentry",
        "div[class*=\"post\"], div[class*=\"entry\"], div[class*=\"article\"]",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub fn default_next_page_selectors() -> Vec<String> {
    [
        "a[title*=\"Older\"]",
        ".blog-pager-older-link",
        ".blog-pager a[href*=\"max-results\"]",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub fn default_keywords() -> Vec<String> {
    [
        "islam",
        "islamic",
        "muslim",
        "muslims",
        "quran",
        "quranic",
        "koran",
        "muhammad",
        "prophet muhammad",
        "allah",
        "hadith",
        "jihad",
        "sharia",
        "mosque",
        "mecca",
        "medina",
        "caliphate",
        "caliph",
        "imam",
        "sunni",
        "shia",
        "shiite",
        "sufi",
        "sufism",
        "ramadan",
        "hajj",
        "pilgrimage",
        "mujahideen",
        "fatwa",
        "ulema",
        "madrasah",
        "madrasa",
        "kaaba",
        "kabah",
        "sunnah",
        "tafsir",
        "ijma",
        "ummah",
        "shariah",
        "halal",
        "haram",
        "bismillah",
        "salah",
        "zakat",
        "sawm",
        "fasting",
        "eid",
        "hijab",
        "burqa",
        "minaret",
        "mihrab",
        "qibla",
        "umrah",
        "tawaf",
        "iftar",
        "sahur",
        "tarawih",
        "khutbah",
        "jummah",
        "dua",
        "dhikr",
        "takbir",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
