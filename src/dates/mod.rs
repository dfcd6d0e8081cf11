//! Publication date resolution
//!
//! Dates are resolved from hints gathered off the page, never from the DOM
//! directly, which keeps the resolver a pure function:
//!
//! - `PageDateHints`: page-wide metadata and JSON-LD blocks
//! - `ElementDateHints`: date-looking markup and visible text of one post
//! - `DateResolver`: runs the ordered strategies and keeps the best result

mod parse;
mod resolver;

pub use parse::{parse_flexible, DateParseError};
pub use resolver::{DateInputs, DateResolver, DateStrategy, MIN_PLAUSIBLE_YEAR};

use chrono::NaiveDateTime;
use std::fmt;

/// Coarse reliability of a resolved date
///
/// Variants are declared from weakest to strongest so the derived ordering can
/// be used directly for precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Confidence {
    Unknown,
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Converts the confidence to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parses a confidence from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "unknown" => Some(Self::Unknown),
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// Source tag used when no strategy produced a date
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Outcome of date resolution for one post
#[derive(Debug, Clone, PartialEq)]
pub struct DateResolution {
    /// The date text exactly as found
    pub raw: Option<String>,

    /// Normalized timestamp (UTC when the source carried an offset)
    pub parsed: Option<NaiveDateTime>,

    /// Provenance tag, e.g. `url_filename` or `meta_article:published_time`
    pub source: String,

    pub confidence: Confidence,
}

impl DateResolution {
    /// The valid "nothing found" outcome
    pub fn unknown() -> Self {
        Self {
            raw: None,
            parsed: None,
            source: UNKNOWN_SOURCE.to_string(),
            confidence: Confidence::Unknown,
        }
    }

    pub(crate) fn found(
        raw: impl Into<String>,
        parsed: NaiveDateTime,
        source: impl Into<String>,
        confidence: Confidence,
    ) -> Self {
        Self {
            raw: Some(raw.into()),
            parsed: Some(parsed),
            source: source.into(),
            confidence,
        }
    }
}

/// Page-wide date hints shared by every post on a listing page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageDateHints {
    /// `(key, value)` pairs from publication-date meta tags, in priority order
    pub meta: Vec<(String, String)>,

    /// Raw bodies of `application/ld+json` script blocks
    pub structured_data: Vec<String>,
}

/// A date-looking element inside a post block
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupHint {
    /// Selector that located the element, used in the source tag
    pub selector: String,

    /// Attribute value or text content
    pub value: String,

    /// Whether `value` came from a machine-readable attribute
    pub machine_readable: bool,
}

/// Date hints belonging to a single post block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementDateHints {
    /// Markup hints in selector priority order
    pub markup: Vec<MarkupHint>,

    /// Visible text of the post block
    pub text: String,
}
