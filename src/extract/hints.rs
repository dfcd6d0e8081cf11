//! Date hint collection
//!
//! Hints are gathered here, while the document is alive, so that the date
//! resolver can run later on plain owned data.

use crate::dates::{ElementDateHints, MarkupHint, PageDateHints};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Where a markup hint takes its value from
#[derive(Debug, Clone, Copy)]
enum HintValue {
    Attribute(&'static str),
    Text,
}

/// Publication-date meta tags, in priority order, with the key recorded for each
const META_TAGS: &[(&str, &str)] = &[
    (r#"meta[property="article:published_time"]"#, "article:published_time"),
    (r#"meta[property="article:modified_time"]"#, "article:modified_time"),
    (r#"meta[name="date"]"#, "date"),
    (r#"meta[name="publish_date"]"#, "publish_date"),
    (r#"meta[name="publication_date"]"#, "publication_date"),
    (r#"meta[name="DC.date.issued"]"#, "DC.date.issued"),
    (r#"meta[itemprop="datePublished"]"#, "datePublished"),
    (r#"meta[itemprop="dateCreated"]"#, "dateCreated"),
];

/// Date-looking markup inside a post block; attribute sources are machine-readable
const MARKUP_SELECTORS: &[(&str, HintValue)] = &[
    ("time[datetime]", HintValue::Attribute("datetime")),
    ("[itemprop=datePublished][content]", HintValue::Attribute("content")),
    ("time", HintValue::Text),
    ("[class*=date]", HintValue::Text),
    ("[class*=publish]", HintValue::Text),
    ("[class*=time]", HintValue::Text),
    (".entry-date", HintValue::Text),
    (".post-date", HintValue::Text),
    (".published", HintValue::Text),
    ("[itemprop=datePublished]", HintValue::Text),
    ("[itemprop=dateCreated]", HintValue::Text),
];

static META_SELECTORS: LazyLock<Vec<(Selector, &'static str)>> = LazyLock::new(|| {
    META_TAGS
        .iter()
        .map(|(css, key)| (Selector::parse(css).unwrap(), *key))
        .collect()
});

static COMPILED_MARKUP: LazyLock<Vec<(Selector, &'static str, HintValue)>> =
    LazyLock::new(|| {
        MARKUP_SELECTORS
            .iter()
            .map(|(css, value)| (Selector::parse(css).unwrap(), *css, *value))
            .collect()
    });

static JSON_LD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());

/// Collects page-wide date hints from a listing page
pub fn page_hints(document: &Html) -> PageDateHints {
    let meta = META_SELECTORS
        .iter()
        .flat_map(|(selector, key)| {
            document
                .select(selector)
                .filter_map(|el| el.value().attr("content"))
                .map(str::trim)
                .filter(|content| !content.is_empty())
                .map(move |content| (key.to_string(), content.to_string()))
        })
        .collect();

    let structured_data = document
        .select(&JSON_LD)
        .map(|script| script.text().collect::<String>())
        .filter(|body| !body.trim().is_empty())
        .collect();

    PageDateHints {
        meta,
        structured_data,
    }
}

/// Collects date hints from one post block
///
/// Every element with a non-empty value is kept, in selector then document
/// order, so the resolver can skip values that do not parse.
pub fn element_hints(block: ElementRef<'_>) -> ElementDateHints {
    let markup = COMPILED_MARKUP
        .iter()
        .flat_map(|(selector, css, source)| {
            block.select(selector).filter_map(move |el| {
                let value = match source {
                    HintValue::Attribute(name) => el.value().attr(name)?.trim().to_string(),
                    HintValue::Text => collapse_text(el),
                };
                (!value.is_empty()).then(|| MarkupHint {
                    selector: css.to_string(),
                    value,
                    machine_readable: matches!(source, HintValue::Attribute(_)),
                })
            })
        })
        .collect();

    ElementDateHints {
        markup,
        text: collapse_text(block),
    }
}

/// All text under an element, whitespace runs collapsed to single spaces
pub fn collapse_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DateResolver;

    #[test]
    fn test_page_hints_in_priority_order() {
        let html = Html::parse_document(
            r#"<html><head>
                <meta name="date" content="2024-02-02">
                <meta property="article:published_time" content=" 2024-01-01T10:00:00Z ">
                <meta name="description" content="not a date">
                <script type="application/ld+json">{"datePublished": "2024-03-03"}</script>
                <script type="application/ld+json">   </script>
            </head><body></body></html>"#,
        );
        let hints = page_hints(&html);
        assert_eq!(
            hints.meta,
            vec![
                (
                    "article:published_time".to_string(),
                    "2024-01-01T10:00:00Z".to_string()
                ),
                ("date".to_string(), "2024-02-02".to_string()),
            ]
        );
        assert_eq!(hints.structured_data.len(), 1);
        assert!(hints.structured_data[0].contains("datePublished"));
    }

    #[test]
    fn test_element_hints() {
        let html = Html::parse_fragment(
            r#"<article>
                <h2>Title</h2>
                <time datetime="2024-05-06T07:00:00Z">May 6</time>
                <span class="post-date">May 6, 2024</span>
                <p>Body   text
                   here</p>
            </article>"#,
        );
        let block = html
            .select(&Selector::parse("article").unwrap())
            .next()
            .unwrap();
        let hints = element_hints(block);

        assert_eq!(hints.markup[0].selector, "time[datetime]");
        assert_eq!(hints.markup[0].value, "2024-05-06T07:00:00Z");
        assert!(hints.markup[0].machine_readable);

        let text_hint = hints
            .markup
            .iter()
            .find(|h| h.selector == ".post-date")
            .unwrap();
        assert_eq!(text_hint.value, "May 6, 2024");
        assert!(!text_hint.machine_readable);

        assert!(hints.text.contains("Body text here"));
    }

    #[test]
    fn test_later_element_of_same_selector_is_kept() {
        let html = Html::parse_fragment(
            r#"<article>
                <time>Updated</time>
                <time>March 15, 2024</time>
            </article>"#,
        );
        let block = html
            .select(&Selector::parse("article").unwrap())
            .next()
            .unwrap();
        let hints = element_hints(block);

        let times: Vec<_> = hints
            .markup
            .iter()
            .filter(|h| h.selector == "time")
            .map(|h| h.value.as_str())
            .collect();
        assert_eq!(times, vec!["Updated", "March 15, 2024"]);

        let date = DateResolver::new().resolve(&PageDateHints::default(), &hints, None);
        assert_eq!(date.source, "post_element_time");
        assert_eq!(
            date.parsed.map(|d| d.date()),
            chrono::NaiveDate::from_ymd_opt(2024, 3, 15)
        );
    }

    #[test]
    fn test_block_without_dates() {
        let html = Html::parse_fragment("<div class='entry'><p>Nothing</p></div>");
        let block = html
            .select(&Selector::parse("div").unwrap())
            .next()
            .unwrap();
        let hints = element_hints(block);
        assert!(hints.markup.is_empty());
        assert_eq!(hints.text, "Nothing");
    }
}
