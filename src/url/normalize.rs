use crate::{UrlError, UrlResult};
use url::Url;

/// Query parameters that never change which post a URL points at
///
/// `m` is the mobile switch appended by hosted blog platforms.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
    "ref",
    "source",
    "m",
];

/// Canonicalizes a URL into the form used for fingerprinting
///
/// Extraction can hand back the same post under slightly different URLs from
/// one run to the next (scheme flipped by a redirect, trailing slash added,
/// tracking parameters appended). Canonicalization folds those differences.
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace, parse; reject if malformed
/// 2. Reject anything but http/https, then fold the scheme to https
/// 3. Lowercase the host and drop a leading `www.`
/// 4. Normalize path:
///    - Remove dot segments (. and ..) and empty segments
///    - Remove trailing slash (except for root /)
/// 5. Remove fragment
/// 6. Remove tracking query parameters
/// 7. Sort remaining query parameters alphabetically and re-encode them
/// 8. Remove empty query string
///
/// # Examples
///
/// ```
/// use topic_harvester::url::normalize_url;
///
/// let url = normalize_url(" http://WWW.Example.com/2024/03/post.html/ ").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/2024/03/post.html");
/// ```
pub fn normalize_url(url_str: &str) -> UrlResult<Url> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.scheme() == "http" {
        url.set_scheme("https")
            .map_err(|_| UrlError::Malformed(format!("Cannot fold scheme of {}", url_str)))?;
    }

    let host = url.host_str().ok_or(UrlError::MissingHost)?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let filtered_params = filter_and_sort_query_params(&url);

        if filtered_params.is_empty() {
            url.set_query(None);
        } else {
            // Re-encode so decoded delimiters stay inside their values
            url.query_pairs_mut()
                .clear()
                .extend_pairs(&filtered_params);
        }
    }

    Ok(url)
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    // Joining non-empty segments never leaves a trailing slash
    format!("/{}", segments.join("/"))
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort();
    params
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_folds_to_https() {
        let result = normalize_url("http://example.com/page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_remove_www() {
        let result = normalize_url("https://www.example.com/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_remove_trailing_slash() {
        let result = normalize_url("https://example.com/2024/03/post.html/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/2024/03/post.html");
    }

    #[test]
    fn test_keep_root_slash() {
        let result = normalize_url("https://example.com/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_trims_whitespace() {
        let result = normalize_url("  https://example.com/post  \n").unwrap();
        assert_eq!(result.as_str(), "https://example.com/post");
    }

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("https://example.com/post#comments").unwrap();
        assert_eq!(result.as_str(), "https://example.com/post");
    }

    #[test]
    fn test_remove_tracking_and_mobile_params() {
        let result = normalize_url("https://example.com/post.html?m=1&utm_source=feed").unwrap();
        assert_eq!(result.as_str(), "https://example.com/post.html");
    }

    #[test]
    fn test_sort_query_params() {
        let result = normalize_url("https://example.com/search?updated-max=x&max-results=7").unwrap();
        assert_eq!(
            result.as_str(),
            "https://example.com/search?max-results=7&updated-max=x"
        );
    }

    #[test]
    fn test_encoded_delimiters_survive() {
        let encoded = normalize_url("https://example.com/search?q=a%26b&label=x").unwrap();
        assert_eq!(encoded.as_str(), "https://example.com/search?label=x&q=a%26b");

        let split = normalize_url("https://example.com/search?q=a&b&label=x").unwrap();
        assert_ne!(encoded, split);
    }

    #[test]
    fn test_normalize_path_with_dots() {
        let result = normalize_url("https://example.com/a/../b/./c").unwrap();
        assert_eq!(result.as_str(), "https://example.com/b/c");
    }

    #[test]
    fn test_lowercase_host_keeps_path_case() {
        let result = normalize_url("https://EXAMPLE.COM/Post").unwrap();
        assert_eq!(result.as_str(), "https://example.com/Post");
    }

    #[test]
    fn test_variants_share_canonical_form() {
        let a = normalize_url("http://www.example.com/2024/03/post.html").unwrap();
        let b = normalize_url("https://example.com/2024/03/post.html/#top").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("ftp://example.com/page");
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));
    }

    #[test]
    fn test_malformed_url() {
        assert!(normalize_url("not a url").is_err());
    }

    #[test]
    fn test_multiple_slashes() {
        let result = normalize_url("https://example.com///path//to///page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/path/to/page");
    }

    #[test]
    fn test_parent_directory_at_root() {
        let result = normalize_url("https://example.com/../page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }
}
