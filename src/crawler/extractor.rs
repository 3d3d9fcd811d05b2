//! Tag extraction from parsed post pages
//!
//! Extraction is a pure function of the document, the site profile and the
//! requested categories: it never touches the network or the filesystem.

use crate::crawler::parser::{parse_html, PageDocument};
use crate::site::SiteProfile;
use crate::ExtractionError;
use scraper::Selector;

/// Tags harvested from one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Tags in category-list order, document order within a category
    pub tags: Vec<String>,

    /// The page the tags came from
    pub source_url: String,
}

impl ExtractionResult {
    /// The tags as a single `", "`-joined line
    pub fn joined(&self) -> String {
        self.tags.join(", ")
    }
}

fn compile(selector: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(selector).map_err(|e| ExtractionError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Extracts the requested tag categories from a page
///
/// # Extraction Rules
///
/// 1. Locate the first element matching the profile's tags container selector;
///    without it the page is rejected with `ContainerNotFound`
/// 2. For each wanted category, in order, look up its selector
///    - Categories the profile doesn't know are skipped silently
///    - Matching elements inside the container contribute their trimmed text,
///      in document order; duplicates are kept
/// 3. A page that yields no tags at all is rejected with `NoTags`
///
/// # Example
///
/// ```
/// use tagsift::crawler::{extract, parse_html};
/// use tagsift::site::safebooru;
///
/// let html = r#"<ul id="tag-sidebar">
///     <li class="tag-type-general"><a href="?tags=1girl">1girl</a></li>
///     <li class="tag-type-character"><a href="?tags=hatsune_miku">hatsune miku</a></li>
/// </ul>"#;
/// let doc = parse_html(html, "https://safebooru.org/index.php?page=post&s=view&id=1");
/// let wanted = vec!["character".to_string(), "general".to_string()];
///
/// let result = extract(&doc, &safebooru(), &wanted).unwrap();
/// assert_eq!(result.tags, vec!["hatsune miku", "1girl"]);
/// ```
pub fn extract(
    document: &PageDocument,
    profile: &SiteProfile,
    wanted: &[String],
) -> Result<ExtractionResult, ExtractionError> {
    let container_selector = compile(&profile.tags_container_selector)?;
    let container = document
        .html()
        .select(&container_selector)
        .next()
        .ok_or_else(|| ExtractionError::ContainerNotFound {
            selector: profile.tags_container_selector.clone(),
        })?;

    let mut tags = Vec::new();
    for category in wanted {
        let Some(selector) = profile.category_selector(category) else {
            tracing::trace!("Site {} has no '{}' category, skipping", profile.id, category);
            continue;
        };

        let selector = compile(selector)?;
        tags.extend(
            container
                .select(&selector)
                .map(|element| element.text().collect::<String>().trim().to_string())
                .filter(|tag| !tag.is_empty()),
        );
    }

    if tags.is_empty() {
        return Err(ExtractionError::NoTags);
    }

    Ok(ExtractionResult {
        tags,
        source_url: document.url().to_string(),
    })
}

/// Parses a fetched body and extracts its tags in one synchronous step
///
/// The parsed document is dropped before this returns, so callers can hold
/// the result across await points.
pub fn extract_tags(
    body: &str,
    url: &str,
    profile: &SiteProfile,
    wanted: &[String],
) -> Result<ExtractionResult, ExtractionError> {
    let document = parse_html(body, url);
    extract(&document, profile, wanted)
}
