//! Page extraction
//!
//! Turns fetched HTML into owned data the crawl controller can carry across
//! await points:
//! - `posts`: listing page to post candidates
//! - `hints`: raw date hints for the date resolver
//! - `pagination`: the "older posts" link
//! - `article`: main text of a post's own page

mod article;
mod hints;
mod pagination;
mod posts;
mod strategy;

pub use article::{article_text, word_count};
pub use hints::{collapse_text, element_hints, page_hints};
pub use pagination::{find_next_page, NextPageStrategy, PageView};
pub use posts::{
    BlockSelector, ListingPage, PostCandidate, PostExtractor, EXCERPT_CHARS, MISSING_TITLE,
};
pub use strategy::{first_match, ExtractionStrategy};
