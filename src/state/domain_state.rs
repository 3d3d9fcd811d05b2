use crate::crawler::CrawlLimits;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Tracks the state of a domain during crawling
///
/// Holds the per-domain semaphore bounding in-flight requests to the domain and
/// the bookkeeping needed to space out request starts. Only the scheduler's
/// dispatch loop touches this; the permits it hands out travel with the spawned
/// fetch and are released when the fetch finishes.
#[derive(Debug)]
pub struct DomainState {
    /// Permits for concurrent requests to this domain
    permits: Arc<Semaphore>,

    /// Number of requests started against this domain in the current run
    pub request_count: u32,

    /// Timestamp of the last request start to this domain
    pub last_request_time: Option<Instant>,
}

impl DomainState {
    /// Creates a new DomainState allowing `per_domain_limit` concurrent requests
    pub fn new(per_domain_limit: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(per_domain_limit.max(1))),
            request_count: 0,
            last_request_time: None,
        }
    }

    /// Tries to start a request, returning the domain permit on success
    ///
    /// This method enforces:
    /// - The per-domain concurrency limit (a permit must be free)
    /// - The minimum delay between request starts to the same domain
    ///
    /// The request is recorded only when a permit was actually handed out.
    pub fn try_start(&mut self, limits: &CrawlLimits, now: Instant) -> Option<OwnedSemaphorePermit> {
        if self.time_until_next_request(limits, now).is_some() {
            return None;
        }

        let permit = self.permits.clone().try_acquire_owned().ok()?;
        self.record_request(now);
        Some(permit)
    }

    /// Records that a request was started against this domain
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }

    /// Calculates the time until the pacing delay allows the next request
    ///
    /// Returns None if the delay has already elapsed (or no delay is configured).
    /// Concurrency permits are not considered here; a busy domain is woken by
    /// task completion instead.
    pub fn time_until_next_request(&self, limits: &CrawlLimits, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < limits.domain_delay {
            Some(limits.domain_delay - elapsed)
        } else {
            None
        }
    }
}
