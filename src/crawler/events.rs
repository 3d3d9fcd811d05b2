//! Per-page crawl events
//!
//! The crawl core reports what happened to each page through an [`EventSink`]
//! instead of deciding how to log it. [`TracingSink`] forwards events to
//! `tracing`; [`MemorySink`] keeps them for inspection.

use crate::state::TaskState;
use crate::TaskError;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Severity of a crawl event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

/// Something that happened to one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlEvent {
    pub level: EventLevel,

    /// The state the task reached
    pub state: TaskState,

    /// The page URL the event is about
    pub url: String,

    /// HTTP status, when a response was received
    pub status_code: Option<u16>,

    pub message: String,
}

impl CrawlEvent {
    /// A usable response arrived
    pub fn response(url: &str, status_code: u16) -> Self {
        Self {
            level: EventLevel::Info,
            state: TaskState::Fetched,
            url: url.to_string(),
            status_code: Some(status_code),
            message: format!("Got a response from {} (HTTP {})", url, status_code),
        }
    }

    /// Tags were written to `path`
    pub fn written(url: &str, path: &Path, tag_count: usize) -> Self {
        Self {
            level: EventLevel::Info,
            state: TaskState::Written,
            url: url.to_string(),
            status_code: None,
            message: format!("Saved {} tags to {}", tag_count, path.display()),
        }
    }

    /// Maps a task failure onto an event
    ///
    /// Rejections, redirects and extraction/write problems are warnings;
    /// fetch failures are errors.
    pub fn from_error(error: &TaskError) -> Self {
        let state = TaskState::from_error(error);
        let (level, url, status_code, message) = match error {
            TaskError::DomainRejected { url, .. } => {
                (EventLevel::Warn, url.clone(), None, error.to_string())
            }
            TaskError::RedirectDetected { url, referer } => (
                EventLevel::Warn,
                url.clone(),
                None,
                format!(
                    "Response URL is redirected or not found. Tags will not be downloaded for URL: {}",
                    referer
                ),
            ),
            TaskError::Fetch(fetch) => (
                EventLevel::Error,
                fetch.url().to_string(),
                fetch.status_code(),
                fetch.to_string(),
            ),
            TaskError::Extraction { url, source } => (
                EventLevel::Warn,
                url.clone(),
                None,
                format!("Parse tags error: {}", source),
            ),
            TaskError::Write { url, source } => (
                EventLevel::Warn,
                url.clone(),
                None,
                format!("File create error: {}", source),
            ),
        };

        Self {
            level,
            state,
            url,
            status_code,
            message,
        }
    }
}

/// Receives crawl events; implementations must tolerate concurrent calls
pub trait EventSink: Send + Sync {
    fn emit(&self, event: CrawlEvent);
}

/// Forwards events to `tracing` at the matching level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: CrawlEvent) {
        let status = event.status_code.map(|s| s.to_string()).unwrap_or_default();
        match event.level {
            EventLevel::Info => tracing::info!(
                state = %event.state,
                url = %event.url,
                status = %status,
                "{}",
                event.message
            ),
            EventLevel::Warn => tracing::warn!(
                state = %event.state,
                url = %event.url,
                status = %status,
                "{}",
                event.message
            ),
            EventLevel::Error => tracing::error!(
                state = %event.state,
                url = %event.url,
                status = %status,
                "{}",
                event.message
            ),
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<CrawlEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far
    pub fn events(&self) -> Vec<CrawlEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events that left a task in `state`
    pub fn with_state(&self, state: TaskState) -> Vec<CrawlEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.state == state)
            .collect()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: CrawlEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
