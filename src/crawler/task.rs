use crate::url::{extract_domain, parse_http_url};
use crate::UrlError;
use url::Url;

/// A single page to fetch
///
/// Created when enqueued and consumed exactly once by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTask {
    /// The URL to fetch
    pub url: Url,

    /// Distance from the seed (seeds are depth 0)
    pub depth: u32,

    /// Referer to send with the request, if the task came from another page
    pub origin_header: Option<String>,
}

impl FetchTask {
    /// Creates a depth-0 task for an already parsed URL
    pub fn new(url: Url) -> Self {
        Self {
            url,
            depth: 0,
            origin_header: None,
        }
    }

    /// Parses a seed URL into a depth-0 task
    ///
    /// # Examples
    ///
    /// ```
    /// use tagsift::crawler::FetchTask;
    ///
    /// let task = FetchTask::seed("https://safebooru.org/index.php?page=post&s=view&id=1").unwrap();
    /// assert_eq!(task.depth, 0);
    /// assert_eq!(task.domain().as_deref(), Some("safebooru.org"));
    /// ```
    pub fn seed(url: &str) -> Result<Self, UrlError> {
        parse_http_url(url).map(Self::new)
    }

    /// Sets the Referer this task is sent with
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin_header = Some(origin.into());
        self
    }

    /// Lowercase host of the task URL
    pub fn domain(&self) -> Option<String> {
        extract_domain(&self.url)
    }
}
