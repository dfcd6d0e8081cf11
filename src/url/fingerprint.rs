use crate::url::normalize_url;
use sha2::{Digest, Sha256};

/// Computes the stable fingerprint of a post URL
///
/// The fingerprint is the hex SHA-256 of the canonical URL, so two spellings
/// of the same post collapse to one key. Strings that do not parse as URLs are
/// hashed after trimming, which still gives a deterministic key.
///
/// # Examples
///
/// ```
/// use topic_harvester::url::fingerprint_url;
///
/// assert_eq!(
///     fingerprint_url("http://www.example.com/post/"),
///     fingerprint_url("https://example.com/post"),
/// );
/// ```
pub fn fingerprint_url(url: &str) -> String {
    let canonical = match normalize_url(url) {
        Ok(normalized) => normalized.to_string(),
        Err(e) => {
            tracing::debug!("Fingerprinting unparseable URL '{}' verbatim: {}", url, e);
            url.trim().to_string()
        }
    };

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}
