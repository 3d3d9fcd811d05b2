//! Site profiles for the supported booru boards
//!
//! A [`SiteProfile`] describes one target site: the domain it lives on, where the
//! tag list sits in a post page, and which selector picks out each tag category.
//! The [`SiteRegistry`] resolves a site identifier (or one of its synonyms) to its
//! profile.

mod builtin;
mod profile;
mod registry;

pub use builtin::{danbooru, gelbooru, safebooru};
pub use profile::{SiteProfile, POST_ID_PLACEHOLDER};
pub use registry::SiteRegistry;
