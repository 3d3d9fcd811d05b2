//! Output module for persisting tag files and summarizing runs
//!
//! This module handles:
//! - Writing each extraction result to its own uniquely named file
//! - Recording how every task of a run ended

mod report;
mod writer;

pub use report::CrawlReport;
pub use writer::{write_tags, OutputWriter, TAG_FILE_EXTENSION};
