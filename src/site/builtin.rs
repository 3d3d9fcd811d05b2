//! Built-in profiles for the three supported boards

use crate::site::SiteProfile;
use std::collections::BTreeMap;

fn selectors(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(category, selector)| (category.to_string(), selector.to_string()))
        .collect()
}

/// Safebooru: Gelbooru 0.1 markup, tags in the `#tag-sidebar` list
pub fn safebooru() -> SiteProfile {
    SiteProfile {
        id: "safebooru".to_string(),
        aliases: vec!["safe".to_string()],
        allowed_domain: "safebooru.org".to_string(),
        tags_container_selector: "#tag-sidebar".to_string(),
        tag_category_selectors: selectors(&[
            ("artist", "li.tag-type-artist > a"),
            ("character", "li.tag-type-character > a"),
            ("copyright", "li.tag-type-copyright > a"),
            ("general", "li.tag-type-general > a"),
            ("metadata", "li.tag-type-metadata > a"),
        ]),
        post_url_template: Some("https://safebooru.org/index.php?page=post&s=view&id={id}".to_string()),
    }
}

/// Danbooru: one `ul` per category inside `#tag-list`
pub fn danbooru() -> SiteProfile {
    SiteProfile {
        id: "danbooru".to_string(),
        aliases: vec!["dan".to_string()],
        allowed_domain: "danbooru.donmai.us".to_string(),
        tags_container_selector: "#tag-list".to_string(),
        tag_category_selectors: selectors(&[
            ("artist", "ul.artist-tag-list a.search-tag"),
            ("character", "ul.character-tag-list a.search-tag"),
            ("copyright", "ul.copyright-tag-list a.search-tag"),
            ("general", "ul.general-tag-list a.search-tag"),
            ("metadata", "ul.meta-tag-list a.search-tag"),
        ]),
        post_url_template: Some("https://danbooru.donmai.us/posts/{id}".to_string()),
    }
}

/// Gelbooru: Gelbooru 0.2 markup, wiki links are nested so `> a` picks the tag name
pub fn gelbooru() -> SiteProfile {
    SiteProfile {
        id: "gelbooru".to_string(),
        aliases: vec!["gel".to_string()],
        allowed_domain: "gelbooru.com".to_string(),
        tags_container_selector: "#tag-list".to_string(),
        tag_category_selectors: selectors(&[
            ("artist", "li.tag-type-artist > a"),
            ("character", "li.tag-type-character > a"),
            ("copyright", "li.tag-type-copyright > a"),
            ("general", "li.tag-type-general > a"),
            ("metadata", "li.tag-type-metadata > a"),
        ]),
        post_url_template: Some("https://gelbooru.com/index.php?page=post&s=view&id={id}".to_string()),
    }
}
