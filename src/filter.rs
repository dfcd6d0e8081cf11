//! Keyword relevance filter

use crate::extract::PostCandidate;

/// A candidate that passed the filter, with the keyword that matched it
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPost {
    pub candidate: PostCandidate,
    pub keyword: String,
}

/// Case-insensitive substring filter over an ordered keyword list
///
/// When several keywords occur, the one listed first wins, regardless of
/// where each appears in the text.
///
/// # Examples
///
/// ```
/// use topic_harvester::RelevanceFilter;
///
/// let filter = RelevanceFilter::new(["allah", "quran"]);
/// assert_eq!(filter.matches("On the Quran", "and Allah"), Some("allah"));
/// assert_eq!(filter.matches("Gardening", "tomatoes"), None);
/// ```
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    keywords: Vec<String>,
    lowered: Vec<String>,
}

impl RelevanceFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords: Vec<String> = keywords.into_iter().map(Into::into).collect();
        let lowered = keywords.iter().map(|k| k.to_lowercase()).collect();
        Self { keywords, lowered }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Returns the first configured keyword found in `title` + `excerpt`
    pub fn matches(&self, title: &str, excerpt: &str) -> Option<&str> {
        let haystack = format!("{} {}", title, excerpt).to_lowercase();
        self.lowered
            .iter()
            .position(|keyword| haystack.contains(keyword.as_str()))
            .map(|i| self.keywords[i].as_str())
    }

    /// Keeps the matching candidates of one page, in page order
    pub fn filter_page(&self, candidates: Vec<PostCandidate>) -> Vec<MatchedPost> {
        candidates
            .into_iter()
            .filter_map(|candidate| {
                let keyword = self.matches(&candidate.title, &candidate.excerpt)?.to_string();
                Some(MatchedPost { candidate, keyword })
            })
            .collect()
    }
}
