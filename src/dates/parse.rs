//! Lenient date parsing for the many shapes blogs print dates in.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use regex::{Captures, Regex};
use std::sync::LazyLock;
use thiserror::Error;

/// Failures inside individual resolver strategies
///
/// These never leave the resolver: a failing strategy is logged and the next
/// one is tried.
#[derive(Debug, Error)]
pub enum DateParseError {
    #[error("empty date string")]
    Empty,

    #[error("unrecognized date format: '{0}'")]
    Unrecognized(String),

    #[error("year {year} outside accepted range {min}..={max}")]
    OutOfRange { year: i32, min: i32, max: i32 },

    #[error("invalid structured data: {0}")]
    StructuredData(#[from] serde_json::Error),
}

/// Formats carrying a UTC offset, tried after RFC 3339 and RFC 2822
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

// US month-first wins over day-first when both are valid
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d.%m.%Y",
];

const MONTH: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";

/// "March 15, 2024", "Mar. 15th 2024", "Friday, March 15, 2024"
static MONTH_DAY_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b{}\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})\b",
        MONTH
    ))
    .unwrap()
});

/// "15 March 2024", "15th of March, 2024"
static DAY_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?{}\.?,?\s+(\d{{4}})\b",
        MONTH
    ))
    .unwrap()
});

/// An ISO date embedded in longer text
static EMBEDDED_ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap());

/// Parses a date or timestamp written in any of the common blog formats
///
/// Offsets are converted to UTC and dropped; date-only inputs resolve to
/// midnight.
///
/// # Examples
///
/// ```
/// use topic_harvester::dates::parse_flexible;
///
/// let parsed = parse_flexible("March 15, 2024").unwrap();
/// assert_eq!(parsed.to_string(), "2024-03-15 00:00:00");
///
/// let parsed = parse_flexible("2024-03-15T10:30:00+02:00").unwrap();
/// assert_eq!(parsed.to_string(), "2024-03-15 08:30:00");
/// ```
pub fn parse_flexible(input: &str) -> Result<NaiveDateTime, DateParseError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DateParseError::Empty);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Ok(dt.naive_utc());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.naive_utc());
        }
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(midnight(date));
        }
    }

    if let Some(date) = MONTH_DAY_YEAR
        .captures(s)
        .and_then(|caps| date_from_names(&caps, 2, 1, 3))
    {
        return Ok(midnight(date));
    }

    if let Some(date) = DAY_MONTH_YEAR
        .captures(s)
        .and_then(|caps| date_from_names(&caps, 1, 2, 3))
    {
        return Ok(midnight(date));
    }

    if let Some(date) = EMBEDDED_ISO_DATE.captures(s).and_then(|caps| {
        NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        )
    }) {
        return Ok(midnight(date));
    }

    Err(DateParseError::Unrecognized(s.to_string()))
}

/// Rejects timestamps whose year falls outside `min..=max`
pub fn check_year(
    parsed: NaiveDateTime,
    min: i32,
    max: i32,
) -> Result<NaiveDateTime, DateParseError> {
    let year = parsed.year();
    if year < min || year > max {
        return Err(DateParseError::OutOfRange { year, min, max });
    }
    Ok(parsed)
}

pub(crate) fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

fn date_from_names(caps: &Captures, day: usize, month: usize, year: usize) -> Option<NaiveDate> {
    let day: u32 = caps.get(day)?.as_str().parse().ok()?;
    let month = month_number(caps.get(month)?.as_str())?;
    let year: i32 = caps.get(year)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_ascii_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
