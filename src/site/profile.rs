use serde::Deserialize;
use std::collections::BTreeMap;

/// Placeholder substituted with a post id by [`SiteProfile::post_url`]
pub const POST_ID_PLACEHOLDER: &str = "{id}";

/// Static description of one target site's domain and markup selectors
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SiteProfile {
    /// Canonical site identifier (e.g. "safebooru")
    pub id: String,

    /// Synonyms accepted on lookup (e.g. "safe")
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Domain the site's post pages are served from
    #[serde(rename = "allowed-domain")]
    pub allowed_domain: String,

    /// Selector for the element wrapping the tag list
    #[serde(rename = "tags-container")]
    pub tags_container_selector: String,

    /// Selector per tag category, evaluated inside the tags container
    #[serde(rename = "categories")]
    pub tag_category_selectors: BTreeMap<String, String>,

    /// Post page URL with an `{id}` placeholder
    #[serde(rename = "post-url-template", default)]
    pub post_url_template: Option<String>,
}

impl SiteProfile {
    /// Returns true if `name` is the id or one of the aliases (case-insensitive)
    pub fn answers_to(&self, name: &str) -> bool {
        let name = name.trim();
        self.id.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    /// Looks up the selector for a tag category
    pub fn category_selector(&self, category: &str) -> Option<&str> {
        self.tag_category_selectors.get(category).map(String::as_str)
    }

    /// Tag categories this profile knows how to extract
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.tag_category_selectors.keys().map(String::as_str)
    }

    /// Builds the post page URL for a post id
    ///
    /// Returns None when the profile has no post URL template.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagsift::site::safebooru;
    ///
    /// let url = safebooru().post_url(42).unwrap();
    /// assert_eq!(url, "https://safebooru.org/index.php?page=post&s=view&id=42");
    /// ```
    pub fn post_url(&self, id: u64) -> Option<String> {
        self.post_url_template
            .as_ref()
            .map(|template| template.replace(POST_ID_PLACEHOLDER, &id.to_string()))
    }
}
