//! Main-content extraction from a post's own page

use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Containers tried in order for the article body
const ARTICLE_SELECTORS: &[&str] = &[".post-body", ".entry-content", ".content", "article", ".post"];

static ARTICLE_CONTAINERS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    ARTICLE_SELECTORS
        .iter()
        .map(|css| Selector::parse(css).unwrap())
        .collect()
});

/// Page furniture whose text never belongs to the article
static EXCLUDED: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".navigation, .sidebar, .footer, .header, .comments, script, style").unwrap()
});

/// Extracts the article text from a full post page
///
/// Returns `None` when no container yields any text, in which case callers
/// keep the listing excerpt.
pub fn article_text(body: &str) -> Option<String> {
    let document = Html::parse_document(body);

    ARTICLE_CONTAINERS
        .iter()
        .filter_map(|selector| document.select(selector).next())
        .map(text_without_furniture)
        .find(|text| !text.is_empty())
}

fn text_without_furniture(container: ElementRef<'_>) -> String {
    let excluded: HashSet<_> = container.select(&EXCLUDED).map(|el| el.id()).collect();

    container
        .descendants()
        .filter(|node| !node.ancestors().any(|a| excluded.contains(&a.id())))
        .filter_map(|node| node.value().as_text())
        .flat_map(|text| text.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Number of whitespace-separated words
pub fn word_count(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}
