use url::Url;

/// Resolves an href found on a page to an absolute http(s) URL
///
/// Returns None if the link should be excluded:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel:, data: schemes
/// - anything that does not resolve to http or https
///
/// # Examples
///
/// ```
/// use topic_harvester::url::resolve_link;
/// use url::Url;
///
/// let page = Url::parse("https://blog.example.com/search?page=2").unwrap();
/// let post = resolve_link("/2024/03/post.html", &page).unwrap();
/// assert_eq!(post.as_str(), "https://blog.example.com/2024/03/post.html");
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    base_url
        .join(href)
        .ok()
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://blog.example.com/index.html").unwrap()
    }

    #[test]
    fn test_absolute_link() {
        let url = resolve_link("https://other.com/page", &base_url()).unwrap();
        assert_eq!(url.as_str(), "https://other.com/page");
    }

    #[test]
    fn test_relative_links() {
        assert_eq!(
            resolve_link("/other", &base_url()).unwrap().as_str(),
            "https://blog.example.com/other"
        );
        assert_eq!(
            resolve_link("other", &base_url()).unwrap().as_str(),
            "https://blog.example.com/other"
        );
    }

    #[test]
    fn test_skipped_links() {
        for href in [
            "",
            "   ",
            "#section",
            "javascript:void(0)",
            "JavaScript:alert(1)",
            "mailto:test@example.com",
            "tel:+1234567890",
            "data:text/html,<h1>x</h1>",
            "ftp://files.example.com/a",
        ] {
            assert!(resolve_link(href, &base_url()).is_none(), "{} resolved", href);
        }
    }
}
