//! "Older posts" link discovery

use crate::extract::strategy::{first_match, ExtractionStrategy};
use crate::url::resolve_link;
use crate::{ConfigError, ConfigResult};
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

static ANY_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// A listing page together with the URL its links resolve against
#[derive(Debug, Clone, Copy)]
pub struct PageView<'a> {
    pub document: &'a Html,
    pub url: &'a Url,
}

/// One way of locating the next listing page
#[derive(Debug, Clone)]
pub enum NextPageStrategy {
    /// A configured CSS selector pointing at the link (or a container of it)
    Selector { css: String, selector: Selector },

    /// Any link whose text mentions "older"
    OlderLinkText,
}

impl NextPageStrategy {
    pub fn selector(css: &str) -> ConfigResult<Self> {
        let selector = Selector::parse(css)
            .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", css, e)))?;
        Ok(Self::Selector {
            css: css.to_string(),
            selector,
        })
    }
}

impl<'a> ExtractionStrategy<'a, PageView<'a>> for NextPageStrategy {
    type Output = Url;

    fn name(&self) -> &str {
        match self {
            Self::Selector { css, .. } => css.as_str(),
            Self::OlderLinkText => "older_link_text",
        }
    }

    fn try_extract(&self, page: &'a PageView<'a>) -> Option<Url> {
        match self {
            Self::Selector { selector, .. } => page
                .document
                .select(selector)
                .flat_map(|el| {
                    // The selector may hit the anchor itself or a wrapper around it
                    let own = el.value().attr("href");
                    own.into_iter()
                        .chain(el.select(&ANY_LINK).filter_map(|a| a.value().attr("href")))
                })
                .find_map(|href| resolve_link(href, page.url)),
            Self::OlderLinkText => page
                .document
                .select(&ANY_LINK)
                .filter(|a| a.text().collect::<String>().to_lowercase().contains("older"))
                .filter_map(|a| a.value().attr("href"))
                .find_map(|href| resolve_link(href, page.url)),
        }
    }
}

/// Returns the first next-page link any strategy can resolve
pub fn find_next_page(document: &Html, url: &Url, strategies: &[NextPageStrategy]) -> Option<Url> {
    let page = PageView { document, url };
    first_match(strategies, &page).map(|(strategy, next)| {
        tracing::debug!("Next page via {}: {}", strategy.name(), next);
        next
    })
}
