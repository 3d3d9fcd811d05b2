//! Configuration module for Tagsift
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and turning post id ranges into seed URLs.
//!
//! # Example
//!
//! ```no_run
//! use tagsift::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("tagsift.toml")).unwrap();
//! println!("Harvesting from: {}", config.tags.site_name());
//! ```

mod parser;
mod seeds;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, OutputConfig, TagsConfig, UserAgentConfig, DEFAULT_CATEGORIES,
    DEFAULT_SITE,
};

pub use parser::{load_config, parse_config};
pub use seeds::{parse_post_ids, seed_tasks};
pub use validation::validate;
