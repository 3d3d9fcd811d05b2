//! Per-task pipeline: fetch → classify → extract → write
//!
//! One [`TaskPipeline`] is built per run and shared by every spawned fetch.
//! It holds everything a task needs, so no crawl configuration lives in
//! global state.

use crate::crawler::events::{CrawlEvent, EventSink, TracingSink};
use crate::crawler::extractor::extract_tags;
use crate::crawler::fetcher::{Classification, Fetcher};
use crate::crawler::{FetchResult, FetchTask};
use crate::output::OutputWriter;
use crate::site::SiteProfile;
use crate::{FetchError, TaskError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Shared, read-only context for processing fetch tasks
pub struct TaskPipeline {
    fetcher: Arc<dyn Fetcher>,
    profile: Arc<SiteProfile>,
    categories: Vec<String>,
    writer: OutputWriter,
    sink: Arc<dyn EventSink>,
}

impl TaskPipeline {
    /// Creates a pipeline that logs through [`TracingSink`]
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Performs the network fetch
    /// * `profile` - Where the tags live on the target site
    /// * `categories` - Tag categories to keep, in output order
    /// * `writer` - Persists each extraction result
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        profile: Arc<SiteProfile>,
        categories: Vec<String>,
        writer: OutputWriter,
    ) -> Self {
        Self {
            fetcher,
            profile,
            categories,
            writer,
            sink: Arc::new(TracingSink),
        }
    }

    /// Replaces the event sink
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub(crate) fn emit(&self, event: CrawlEvent) {
        self.sink.emit(event);
    }

    /// Runs one task to its terminal state
    ///
    /// The fetch is abandoned once `request_timeout` elapses. Every outcome is
    /// reported to the event sink before it is returned.
    pub async fn process(&self, task: FetchTask, request_timeout: Duration) -> Result<PathBuf, TaskError> {
        let url = task.url.to_string();
        tracing::debug!("Fetching {}", url);

        let timed = tokio::time::timeout(request_timeout, self.fetcher.fetch(&task)).await;
        let fetched = match timed {
            Ok(result) => result,
            Err(_) => FetchResult::failure(
                task,
                FetchError::Timeout {
                    url: url.clone(),
                    after: request_timeout,
                },
            ),
        };

        let outcome = self.handle(url, fetched).await;
        if let Err(error) = &outcome {
            self.emit(CrawlEvent::from_error(error));
        }
        outcome
    }

    async fn handle(&self, url: String, fetched: FetchResult) -> Result<PathBuf, TaskError> {
        let body = match fetched.classify() {
            Classification::Failed(error) => return Err(TaskError::Fetch(error)),
            Classification::Redirected { referer } => {
                return Err(TaskError::RedirectDetected { url, referer })
            }
            Classification::Extract { status_code, body } => {
                self.emit(CrawlEvent::response(&url, status_code));
                body
            }
        };

        let extraction = extract_tags(&body, &url, &self.profile, &self.categories)
            .map_err(|source| TaskError::Extraction {
                url: url.clone(),
                source,
            })?;

        let path = self
            .writer
            .write(&extraction)
            .await
            .map_err(|source| TaskError::Write {
                url: url.clone(),
                source,
            })?;

        self.emit(CrawlEvent::written(&url, &path, extraction.tags.len()));
        Ok(path)
    }
}

impl std::fmt::Debug for TaskPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskPipeline")
            .field("site", &self.profile.id)
            .field("categories", &self.categories)
            .field("output", &self.writer.directory())
            .finish_non_exhaustive()
    }
}
