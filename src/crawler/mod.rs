//! Crawler module for fetching post pages and harvesting their tags
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and response classification
//! - HTML parsing and tag extraction
//! - Request scheduling with global and per-domain limits
//! - The per-task fetch → classify → extract → write pipeline

mod coordinator;
mod events;
mod extractor;
mod fetcher;
mod parser;
mod scheduler;
mod task;

pub use coordinator::TaskPipeline;
pub use events::{CrawlEvent, EventLevel, EventSink, MemorySink, TracingSink};
pub use extractor::{extract, extract_tags, ExtractionResult};
pub use fetcher::{build_http_client, Classification, FetchResult, Fetcher, HttpFetcher};
pub use parser::{parse_html, PageDocument};
pub use scheduler::{CrawlLimits, FetchScheduler, ShutdownHandle};
pub use task::FetchTask;
