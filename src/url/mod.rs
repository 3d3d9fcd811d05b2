//! URL handling for the tag crawler
//!
//! This module provides URL parsing for fetch tasks, host extraction,
//! and the domain allow-list every task is checked against before it is queued.

mod allow_list;
mod domain;

pub use allow_list::{matches_wildcard, AllowList};
pub use domain::{extract_domain, parse_http_url};
