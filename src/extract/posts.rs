//! Post extraction from listing pages

use crate::config::ExtractorConfig;
use crate::dates::{ElementDateHints, PageDateHints};
use crate::extract::hints::{collapse_text, element_hints, page_hints};
use crate::extract::pagination::{find_next_page, NextPageStrategy};
use crate::extract::strategy::{first_match, ExtractionStrategy};
use crate::url::resolve_link;
use crate::{ConfigError, ConfigResult};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

/// Maximum number of characters kept in a candidate's excerpt
pub const EXCERPT_CHARS: usize = 500;

/// Placeholder used when a post block has no heading
pub const MISSING_TITLE: &str = "No title found";

static TITLED_HEADING: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1[class*=title], h2[class*=title], h3[class*=title]").unwrap()
});
static HEADING: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1, h2, h3").unwrap());
static MINOR_HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h4, h5, h6").unwrap());
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static CONTENT_BODY: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "div[class*=post-body], div[class*=entry-content], div[class*=content]",
    )
    .unwrap()
});
static CONTENT_FALLBACK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div, p").unwrap());

/// A provisionally extracted post, not yet checked for relevance or duplicates
#[derive(Debug, Clone, PartialEq)]
pub struct PostCandidate {
    pub title: String,

    /// Absolute URL resolved against the listing page
    pub url: Url,

    /// Whole content text of the post block
    pub content: String,

    /// First `EXCERPT_CHARS` characters of `content`
    pub excerpt: String,

    /// Date hints found inside the post block
    pub date_hints: ElementDateHints,
}

/// Everything taken from one listing page
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub candidates: Vec<PostCandidate>,

    /// Date hints shared by every post on the page
    pub page_hints: PageDateHints,

    /// The "older posts" link, if the page has one
    pub next_page: Option<Url>,

    /// Block selector that located the posts, `None` if none matched
    pub block_selector: Option<String>,
}

/// One structural pattern for post containers
#[derive(Debug, Clone)]
pub struct BlockSelector {
    css: String,
    selector: Selector,
}

impl BlockSelector {
    pub fn parse(css: &str) -> ConfigResult<Self> {
        let selector = Selector::parse(css)
            .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", css, e)))?;
        Ok(Self {
            css: css.to_string(),
            selector,
        })
    }
}

impl<'a> ExtractionStrategy<'a, Html> for BlockSelector {
    type Output = Vec<ElementRef<'a>>;

    fn name(&self) -> &str {
        &self.css
    }

    fn try_extract(&self, document: &'a Html) -> Option<Vec<ElementRef<'a>>> {
        let blocks: Vec<_> = document.select(&self.selector).collect();
        (!blocks.is_empty()).then_some(blocks)
    }
}

/// Splits listing pages into post candidates
///
/// Block selectors are tried in order and only the first one that matches
/// anything is used; results are never merged across selectors.
#[derive(Debug, Clone)]
pub struct PostExtractor {
    block_selectors: Vec<BlockSelector>,
    next_page: Vec<NextPageStrategy>,
}

impl PostExtractor {
    pub fn new(config: &ExtractorConfig) -> ConfigResult<Self> {
        let block_selectors = config
            .post_selectors
            .iter()
            .map(|css| BlockSelector::parse(css))
            .collect::<ConfigResult<Vec<_>>>()?;

        let mut next_page = config
            .next_page_selectors
            .iter()
            .map(|css| NextPageStrategy::selector(css))
            .collect::<ConfigResult<Vec<_>>>()?;
        next_page.push(NextPageStrategy::OlderLinkText);

        Ok(Self {
            block_selectors,
            next_page,
        })
    }

    /// Parses a listing page body into owned results
    ///
    /// The parsed document never outlives this call.
    pub fn parse_listing(&self, body: &str, page_url: &Url) -> ListingPage {
        let document = Html::parse_document(body);

        let block_selector = first_match(&self.block_selectors, &document)
            .map(|(strategy, _)| strategy.name().to_string());
        let candidates: Vec<_> = self.extract(&document, page_url).collect();
        let next_page = find_next_page(&document, page_url, &self.next_page);

        tracing::debug!(
            "Found {} candidates on {} (selector: {})",
            candidates.len(),
            page_url,
            block_selector.as_deref().unwrap_or("none")
        );

        ListingPage {
            candidates,
            page_hints: page_hints(&document),
            next_page,
            block_selector,
        }
    }

    /// Lazily yields the candidates of an already-parsed page
    ///
    /// Blocks without a resolvable link are skipped. A page with no post
    /// blocks yields nothing.
    pub fn extract<'a>(
        &'a self,
        document: &'a Html,
        page_url: &'a Url,
    ) -> impl Iterator<Item = PostCandidate> + 'a {
        first_match(&self.block_selectors, document)
            .map(|(_, blocks)| blocks)
            .unwrap_or_default()
            .into_iter()
            .filter_map(move |block| candidate_from_block(block, page_url))
    }
}

fn candidate_from_block(block: ElementRef<'_>, page_url: &Url) -> Option<PostCandidate> {
    let heading = find_heading(block);
    let title = heading
        .map(collapse_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| MISSING_TITLE.to_string());

    let Some(url) = find_link(block, heading, page_url) else {
        tracing::debug!("Skipping post block without a usable link: {}", title);
        return None;
    };

    let content = content_text(block);
    Some(PostCandidate {
        title,
        url,
        excerpt: excerpt(&content, EXCERPT_CHARS),
        content,
        date_hints: element_hints(block),
    })
}

fn find_heading(block: ElementRef<'_>) -> Option<ElementRef<'_>> {
    [&*TITLED_HEADING, &*HEADING, &*MINOR_HEADING]
        .into_iter()
        .find_map(|selector| block.select(selector).next())
}

/// Prefers the heading's own link, then a link wrapping the heading, then the
/// first resolvable link anywhere in the block
fn find_link(block: ElementRef<'_>, heading: Option<ElementRef<'_>>, page_url: &Url) -> Option<Url> {
    let from_heading = heading.and_then(|h| {
        h.select(&LINK)
            .next()
            .or_else(|| {
                h.ancestors()
                    .filter_map(ElementRef::wrap)
                    .take_while(|el| el.id() != block.id())
                    .find(|el| el.value().name() == "a" && el.value().attr("href").is_some())
            })
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| resolve_link(href, page_url))
    });

    from_heading.or_else(|| {
        block
            .select(&LINK)
            .filter_map(|a| a.value().attr("href"))
            .find_map(|href| resolve_link(href, page_url))
    })
}

fn content_text(block: ElementRef<'_>) -> String {
    block
        .select(&CONTENT_BODY)
        .next()
        .or_else(|| block.select(&CONTENT_FALLBACK).next())
        .map(collapse_text)
        .unwrap_or_else(|| collapse_text(block))
}

/// Truncates on a character boundary
fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
