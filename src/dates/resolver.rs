//! Multi-strategy publication date resolver

use crate::dates::parse::{check_year, midnight, parse_flexible, DateParseError};
use crate::dates::{Confidence, DateResolution, ElementDateHints, PageDateHints};
use crate::extract::ExtractionStrategy;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use url::Url;

/// Oldest year the free-text scan will believe
pub const MIN_PLAUSIBLE_YEAR: i32 = 2000;

/// `...-2024-03-15.html` in the last path segment
static URL_FILENAME_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-(\d{4})-(\d{2})-(\d{2})(?:\D|$)").unwrap());

/// `/2024/03/` anywhere in the path
static URL_PATH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\d{4})/(\d{2})/").unwrap());

/// Date-shaped substrings in visible text, most specific first
static FREE_TEXT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(?:published|posted|date)\s*:?\s*(?:on\s+)?([a-z]+\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4})",
        r"(?i)\b([a-z]+\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4})\b",
        r"(?i)\b(\d{1,2}(?:st|nd|rd|th)?\s+(?:of\s+)?[a-z]+\.?,?\s+\d{4})\b",
        r"\b(\d{1,2}/\d{1,2}/\d{4})\b",
        r"\b(\d{4}-\d{2}-\d{2})\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Keys checked on JSON-LD objects, in priority order
const STRUCTURED_DATE_KEYS: &[&str] = &["datePublished", "dateCreated", "publishedDate"];

/// Everything a strategy may look at for one post
#[derive(Debug, Clone, Copy)]
pub struct DateInputs<'a> {
    pub page: &'a PageDateHints,
    pub element: &'a ElementDateHints,
    pub url: Option<&'a str>,
}

/// One way of finding a publication date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStrategy {
    /// Trailing `-YYYY-MM-DD` in the post URL's file name (high)
    UrlFilename,

    /// `/YYYY/MM/` in the post URL's path, day defaulting to the 1st (medium)
    UrlPath,

    /// Publication-date meta tags on the page (high)
    PageMeta,

    /// JSON-LD blocks, single object, array, or `@graph` form (high)
    StructuredData,

    /// Date-looking markup inside the post (medium if machine-readable, else low)
    ElementMarkup,

    /// Regex scan of the post's visible text (low, year-bounded)
    FreeText { min_year: i32, max_year: i32 },
}

impl DateStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::UrlFilename => "url_filename",
            Self::UrlPath => "url_pattern",
            Self::PageMeta => "page_meta",
            Self::StructuredData => "structured_data",
            Self::ElementMarkup => "element_markup",
            Self::FreeText { .. } => "content_regex",
        }
    }
}

impl<'a> ExtractionStrategy<'a, DateInputs<'a>> for DateStrategy {
    type Output = DateResolution;

    fn name(&self) -> &str {
        DateStrategy::name(self)
    }

    fn try_extract(&self, inputs: &'a DateInputs<'a>) -> Option<DateResolution> {
        match *self {
            Self::UrlFilename => inputs.url.and_then(from_url_filename),
            Self::UrlPath => inputs.url.and_then(from_url_path),
            Self::PageMeta => from_page_meta(inputs.page),
            Self::StructuredData => from_structured_data(inputs.page),
            Self::ElementMarkup => from_element_markup(inputs.element),
            Self::FreeText { min_year, max_year } => {
                from_free_text(&inputs.element.text, min_year, max_year)
            }
        }
    }
}

/// Resolves the best-confidence publication date for a post
///
/// Strategies run in a fixed order. The first `High` result wins at once;
/// otherwise the highest confidence seen is kept, earlier strategies winning
/// ties. When nothing parses the result is `DateResolution::unknown()`, which
/// is a normal outcome.
#[derive(Debug, Clone)]
pub struct DateResolver {
    strategies: Vec<DateStrategy>,
}

impl DateResolver {
    /// Creates a resolver accepting free-text years up to next year
    pub fn new() -> Self {
        Self::with_year_range(MIN_PLAUSIBLE_YEAR, Utc::now().year() + 1)
    }

    /// Creates a resolver with an explicit free-text year window
    pub fn with_year_range(min_year: i32, max_year: i32) -> Self {
        Self {
            strategies: vec![
                DateStrategy::UrlFilename,
                DateStrategy::UrlPath,
                DateStrategy::PageMeta,
                DateStrategy::StructuredData,
                DateStrategy::ElementMarkup,
                DateStrategy::FreeText { min_year, max_year },
            ],
        }
    }

    pub fn strategies(&self) -> &[DateStrategy] {
        &self.strategies
    }

    pub fn resolve(
        &self,
        page: &PageDateHints,
        element: &ElementDateHints,
        url: Option<&str>,
    ) -> DateResolution {
        let inputs = DateInputs { page, element, url };
        let mut best: Option<DateResolution> = None;

        for strategy in &self.strategies {
            let Some(found) = strategy.try_extract(&inputs) else {
                tracing::trace!("Date strategy {} found nothing", strategy.name());
                continue;
            };

            if found.confidence == Confidence::High {
                return found;
            }

            if best
                .as_ref()
                .map_or(true, |current| found.confidence > current.confidence)
            {
                best = Some(found);
            }
        }

        best.unwrap_or_else(DateResolution::unknown)
    }
}

impl Default for DateResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses one candidate value, logging why it was rejected
fn attempt(raw: &str, source: &str) -> Option<NaiveDateTime> {
    match parse_flexible(raw) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::debug!("Date candidate from {} rejected: {}", source, e);
            None
        }
    }
}

fn url_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    }
}

fn from_url_filename(url: &str) -> Option<DateResolution> {
    let path = url_path(url);
    let filename = path.rsplit('/').find(|segment| !segment.is_empty())?;
    let caps = URL_FILENAME_DATE.captures(filename)?;

    let (year, month, day) = (&caps[1], &caps[2], &caps[3]);
    let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)?;

    Some(DateResolution::found(
        format!("{}-{}-{}", year, month, day),
        midnight(date),
        "url_filename",
        Confidence::High,
    ))
}

fn from_url_path(url: &str) -> Option<DateResolution> {
    let path = url_path(url);
    let caps = URL_PATH_DATE.captures(&path)?;

    let (year, month) = (&caps[1], &caps[2]);
    let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)?;

    Some(DateResolution::found(
        format!("{}-{}", year, month),
        midnight(date),
        "url_pattern",
        Confidence::Medium,
    ))
}

fn from_page_meta(page: &PageDateHints) -> Option<DateResolution> {
    page.meta.iter().find_map(|(key, value)| {
        let source = format!("meta_{}", key);
        attempt(value, &source)
            .map(|parsed| DateResolution::found(value.trim(), parsed, source, Confidence::High))
    })
}

fn from_structured_data(page: &PageDateHints) -> Option<DateResolution> {
    page.structured_data.iter().find_map(|block| {
        match serde_json::from_str::<Value>(block) {
            Ok(value) => from_json_ld(&value),
            Err(e) => {
                tracing::debug!("Skipping JSON-LD block: {}", DateParseError::from(e));
                None
            }
        }
    })
}

fn from_json_ld(value: &Value) -> Option<DateResolution> {
    match value {
        Value::Object(_) => json_ld_date(value, "json_ld").or_else(|| {
            value
                .get("@graph")
                .and_then(Value::as_array)
                .and_then(|items| items.iter().find_map(|item| json_ld_date(item, "json_ld_array")))
        }),
        Value::Array(items) => items
            .iter()
            .find_map(|item| json_ld_date(item, "json_ld_array")),
        _ => None,
    }
}

fn json_ld_date(item: &Value, source: &str) -> Option<DateResolution> {
    let raw = STRUCTURED_DATE_KEYS
        .iter()
        .filter_map(|key| item.get(*key).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())?;

    attempt(raw, source).map(|parsed| DateResolution::found(raw.trim(), parsed, source, Confidence::High))
}

fn from_element_markup(element: &ElementDateHints) -> Option<DateResolution> {
    element.markup.iter().find_map(|hint| {
        let source = format!("post_element_{}", hint.selector);
        let confidence = if hint.machine_readable {
            Confidence::Medium
        } else {
            Confidence::Low
        };
        attempt(&hint.value, &source)
            .map(|parsed| DateResolution::found(hint.value.trim(), parsed, source, confidence))
    })
}

fn from_free_text(text: &str, min_year: i32, max_year: i32) -> Option<DateResolution> {
    for pattern in FREE_TEXT_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let raw = &caps[1];
            match parse_flexible(raw).and_then(|parsed| check_year(parsed, min_year, max_year)) {
                Ok(parsed) => {
                    return Some(DateResolution::found(
                        raw,
                        parsed,
                        "content_regex",
                        Confidence::Low,
                    ))
                }
                Err(e) => tracing::trace!("Free-text date '{}' rejected: {}", raw, e),
            }
        }
    }
    None
}
