//! HTML parsing for fetched post pages
//!
//! The parsed document wraps `scraper::Html`, which is not `Send`. Parse only
//! after the last await of a task, then drop the document before awaiting again.

use scraper::Html;

/// A parsed post page
pub struct PageDocument {
    html: Html,
    url: String,
}

impl PageDocument {
    /// The parsed HTML tree
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// The URL the page was fetched from
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for PageDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageDocument")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// Parses HTML content into a page document
///
/// html5ever recovers from malformed markup, so parsing itself never fails;
/// a page without the expected structure surfaces later as an extraction error.
///
/// # Example
///
/// ```
/// use tagsift::crawler::parse_html;
///
/// let html = r#"<html><body><ul id="tag-sidebar"><li>tag</li></ul></body></html>"#;
/// let document = parse_html(html, "https://safebooru.org/index.php?page=post&s=view&id=1");
/// assert_eq!(document.url(), "https://safebooru.org/index.php?page=post&s=view&id=1");
/// ```
pub fn parse_html(html: &str, url: &str) -> PageDocument {
    PageDocument {
        html: Html::parse_document(html),
        url: url.to_string(),
    }
}
