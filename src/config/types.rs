use crate::crawler::CrawlLimits;
use crate::site::{SiteProfile, SiteRegistry};
use serde::Deserialize;
use std::path::PathBuf;

/// Tag categories harvested when the config doesn't name any
pub const DEFAULT_CATEGORIES: [&str; 4] = ["artist", "character", "copyright", "general"];

/// Site used when neither the config nor the command line names one
pub const DEFAULT_SITE: &str = "safebooru";

/// Main configuration structure for Tagsift
///
/// Every section is optional; a missing section falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub tags: TagsConfig,

    /// Extra site profiles; a profile with a built-in id replaces it
    #[serde(rename = "site", default)]
    pub sites: Vec<SiteProfile>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of concurrent fetches across all domains
    #[serde(rename = "max-parallelism")]
    pub max_parallelism: u32,

    /// Maximum number of concurrent fetches to one domain
    #[serde(rename = "per-domain-limit")]
    pub per_domain_limit: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Minimum time between requests to the same domain (milliseconds)
    #[serde(rename = "domain-delay-ms")]
    pub domain_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_parallelism: 8,
            per_domain_limit: 4,
            request_timeout_secs: 30,
            domain_delay_ms: 0,
        }
    }
}

impl CrawlerConfig {
    /// The scheduler limits this config describes
    pub fn limits(&self) -> CrawlLimits {
        CrawlLimits::from(self)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "tagsift".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory tag files are written to
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("tags"),
        }
    }
}

/// What to harvest
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TagsConfig {
    /// Site id or synonym
    pub site: Option<String>,

    /// Tag categories to keep, in output order
    pub categories: Vec<String>,

    /// Post page URLs to fetch
    pub seeds: Vec<String>,
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            site: None,
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            seeds: Vec::new(),
        }
    }
}

impl TagsConfig {
    /// The configured site, or the default one
    pub fn site_name(&self) -> &str {
        self.site.as_deref().unwrap_or(DEFAULT_SITE)
    }
}

impl Config {
    /// Built-in site profiles plus the ones declared in this config
    pub fn registry(&self) -> SiteRegistry {
        SiteRegistry::builtin().with_profiles(self.sites.iter().cloned())
    }
}
