//! Tagsift: a concurrent tag harvester for booru image boards
//!
//! This crate fetches post pages from a small set of allow-listed sites, extracts
//! tag lists using a per-site selector profile, and writes every extraction result
//! to its own uniquely named file.

pub mod config;
pub mod crawler;
pub mod output;
pub mod site;
pub mod state;
pub mod url;

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level error type for driver-level operations
#[derive(Debug, Error)]
pub enum TagsiftError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown site '{0}'")]
    UnknownSite(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL '{url}': {source}")]
    Parse {
        url: String,
        source: ::url::ParseError,
    },

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Reasons a single fetch can fail
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },
}

impl FetchError {
    /// The URL the failed fetch was aimed at
    pub fn url(&self) -> &str {
        match self {
            FetchError::Status { url, .. }
            | FetchError::Timeout { url, .. }
            | FetchError::Network { url, .. } => url,
        }
    }

    /// The HTTP status, if the server answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Reasons tag extraction can fail for a fetched page
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Tags container '{selector}' not found")]
    ContainerNotFound { selector: String },

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("No tags matched the requested categories")]
    NoTags,
}

/// Reasons an extraction result could not be persisted
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Per-task failure. None of these abort a crawl run.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Domain '{host}' is not allowed, dropping {url}")]
    DomainRejected { url: String, host: String },

    #[error("Response for {url} was redirected (referer: {referer})")]
    RedirectDetected { url: String, referer: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Extraction failed for {url}: {source}")]
    Extraction {
        url: String,
        source: ExtractionError,
    },

    #[error("Write failed for {url}: {source}")]
    Write { url: String, source: WriteError },
}

/// Result type alias for driver-level operations
pub type Result<T> = std::result::Result<T, TagsiftError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlLimits, FetchScheduler, FetchTask};
pub use output::CrawlReport;
pub use site::{SiteProfile, SiteRegistry};
pub use crate::url::{extract_domain, AllowList};
