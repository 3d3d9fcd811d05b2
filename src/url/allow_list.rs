use crate::url::extract_domain;
use url::Url;

/// Checks if a domain matches a wildcard pattern
///
/// This function supports two types of patterns:
/// 1. Exact match: "gelbooru.com" matches only "gelbooru.com"
/// 2. Wildcard match: "*.donmai.us" matches:
///    - "donmai.us" (the bare domain)
///    - "danbooru.donmai.us" (single subdomain)
///    - "cdn.danbooru.donmai.us" (nested subdomains)
///
/// # Examples
///
/// ```
/// use tagsift::url::matches_wildcard;
///
/// assert!(matches_wildcard("gelbooru.com", "gelbooru.com"));
/// assert!(!matches_wildcard("gelbooru.com", "safebooru.org"));
///
/// assert!(matches_wildcard("*.donmai.us", "donmai.us"));
/// assert!(matches_wildcard("*.donmai.us", "danbooru.donmai.us"));
/// assert!(!matches_wildcard("*.donmai.us", "donmai.us.example.org"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base || candidate.ends_with(&format!(".{}", base))
    } else {
        candidate == pattern
    }
}

/// The fixed set of domains the crawler may fetch from
///
/// Entries are lowercase domain patterns (see [`matches_wildcard`]). The list is
/// built once at startup and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    patterns: Vec<String>,
}

impl AllowList {
    /// Builds an allow-list from domain patterns
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        for pattern in patterns {
            let pattern = pattern.as_ref().trim().to_lowercase();
            if !pattern.is_empty() && !list.patterns.contains(&pattern) {
                list.patterns.push(pattern);
            }
        }
        list
    }

    /// Returns true if the host is covered by one of the patterns
    pub fn allows_host(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        self.patterns.iter().any(|p| matches_wildcard(p, &host))
    }

    /// Returns true if the URL's host is covered by one of the patterns
    pub fn allows(&self, url: &Url) -> bool {
        extract_domain(url).is_some_and(|host| self.allows_host(&host))
    }

    /// The configured patterns, in insertion order
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
