//! Scheduler for the fetch queue and concurrency limits
//!
//! This module handles:
//! - The shared queue of fetch tasks, fed through [`FetchScheduler::submit`]
//! - Allow-list enforcement before a task is queued
//! - Global concurrency limiting via a semaphore
//! - Per-domain concurrency limiting and request spacing
//! - Request timeouts and graceful shutdown

use crate::config::CrawlerConfig;
use crate::crawler::events::CrawlEvent;
use crate::crawler::{FetchTask, TaskPipeline};
use crate::output::CrawlReport;
use crate::state::{DomainState, TaskState};
use crate::url::AllowList;
use crate::TaskError;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};

/// Limits a crawl run is executed under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlLimits {
    /// Maximum in-flight requests process-wide
    pub max_parallelism: usize,

    /// Maximum in-flight requests to any single domain
    pub per_domain_limit: usize,

    /// Fetches running longer than this are cancelled
    pub request_timeout: Duration,

    /// Minimum time between two request starts to the same domain
    pub domain_delay: Duration,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            max_parallelism: 8,
            per_domain_limit: 4,
            request_timeout: Duration::from_secs(30),
            domain_delay: Duration::ZERO,
        }
    }
}

impl From<&CrawlerConfig> for CrawlLimits {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_parallelism: config.max_parallelism as usize,
            per_domain_limit: config.per_domain_limit as usize,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            domain_delay: Duration::from_millis(config.domain_delay_ms),
        }
    }
}

impl CrawlLimits {
    /// Clamps both concurrency limits to at least one
    fn normalized(self) -> Self {
        Self {
            max_parallelism: self.max_parallelism.max(1),
            per_domain_limit: self.per_domain_limit.max(1),
            ..self
        }
    }
}

/// Tasks waiting to start, grouped by host
///
/// Dispatch looks only at the head of each host's queue, so finding the next
/// task costs one check per waiting host regardless of queue length.
#[derive(Debug, Default)]
struct PendingTasks {
    by_domain: HashMap<String, VecDeque<FetchTask>>,

    /// Hosts with waiting tasks, in the order they are offered a slot
    rotation: VecDeque<String>,

    len: usize,
}

impl PendingTasks {
    fn push(&mut self, domain: String, task: FetchTask) {
        match self.by_domain.get_mut(&domain) {
            Some(queue) => queue.push_back(task),
            None => {
                self.by_domain
                    .insert(domain.clone(), VecDeque::from([task]));
                self.rotation.push_back(domain);
            }
        }
        self.len += 1;
    }

    /// Takes the oldest task of the host at `position` in the rotation
    ///
    /// A host that still has tasks moves to the back of the rotation, so hosts
    /// take turns.
    fn take(&mut self, position: usize) -> Option<FetchTask> {
        let domain = self.rotation.remove(position)?;
        let queue = self.by_domain.get_mut(&domain)?;
        let task = queue.pop_front();

        if queue.is_empty() {
            self.by_domain.remove(&domain);
        } else {
            self.rotation.push_back(domain);
        }

        if task.is_some() {
            self.len -= 1;
        }
        task
    }

    fn len(&self) -> usize {
        self.len
    }
}

/// State shared between the scheduler, its shutdown handles and `submit` callers
struct Shared {
    allow_list: AllowList,
    queue: Mutex<PendingTasks>,
    wake: Notify,
    shutdown: AtomicBool,
    rejected: AtomicU64,
    pipeline: Arc<TaskPipeline>,
}

impl Shared {
    fn queue(&self) -> MutexGuard<'_, PendingTasks> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

/// Stops a running scheduler from dequeuing further tasks
#[derive(Clone)]
pub struct ShutdownHandle {
    shared: Arc<Shared>,
}

impl ShutdownHandle {
    /// Requests shutdown; in-flight fetches still run to completion or timeout
    pub fn shutdown(&self) {
        self.shared.shutdown.store(true, Ordering::SeqCst);
        self.shared.wake.notify_one();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.is_shutdown()
    }
}

/// The next queued task the dispatcher may start
enum Dispatch {
    Ready {
        task: FetchTask,
        permit: OwnedSemaphorePermit,
    },

    /// Nothing can start now; retry after the given delay, or on task
    /// completion when there is none
    Wait(Option<Duration>),
}

/// FetchScheduler drives fetch tasks through the pipeline under crawl limits
///
/// The scheduler coordinates:
/// - Global concurrency limits (max in-flight fetches)
/// - Per-domain concurrency limits and minimum request spacing
/// - Allow-list checks, so rejected tasks never take a slot
/// - Dispatch of each started task to the fetch → extract → write pipeline
pub struct FetchScheduler {
    shared: Arc<Shared>,
}

impl FetchScheduler {
    /// Creates a scheduler
    ///
    /// # Arguments
    ///
    /// * `allow_list` - Domains tasks may target
    /// * `pipeline` - Processes every started task
    pub fn new(allow_list: AllowList, pipeline: TaskPipeline) -> Self {
        Self {
            shared: Arc::new(Shared {
                allow_list,
                queue: Mutex::new(PendingTasks::default()),
                wake: Notify::new(),
                shutdown: AtomicBool::new(false),
                rejected: AtomicU64::new(0),
                pipeline: Arc::new(pipeline),
            }),
        }
    }

    /// Queues a task
    ///
    /// Tasks whose host is not on the allow-list are dropped here: the rejection
    /// is reported to the event sink, counted in the run report, and returned,
    /// but it never affects other tasks.
    pub fn submit(&self, task: FetchTask) -> Result<(), TaskError> {
        let host = task.domain().unwrap_or_default();
        if !self.shared.allow_list.allows_host(&host) {
            let error = TaskError::DomainRejected {
                url: task.url.to_string(),
                host,
            };
            self.shared.rejected.fetch_add(1, Ordering::SeqCst);
            self.shared.pipeline.emit(CrawlEvent::from_error(&error));
            return Err(error);
        }

        tracing::trace!("Queued {}", task.url);
        self.shared.queue().push(host, task);
        self.shared.wake.notify_one();
        Ok(())
    }

    /// Returns the number of tasks waiting to start
    pub fn queue_size(&self) -> usize {
        self.shared.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue_size() == 0
    }

    /// Handle that can stop [`run`](Self::run) from another task
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Runs queued tasks until the queue is drained and nothing is in flight
    ///
    /// # Scheduling
    ///
    /// 1. Acquire a global permit (bounded by `max_parallelism`)
    /// 2. Offer the slot to each waiting domain in turn; the first one with a
    ///    free permit and elapsed request spacing starts its oldest task. Tasks
    ///    of one domain always start in submit order
    /// 3. Spawn the task; it holds both permits until it finishes
    /// 4. When nothing can start, wait for a completion, a submit, shutdown,
    ///    or the earliest domain delay to elapse
    ///
    /// After shutdown no new task is started; in-flight tasks are awaited.
    pub async fn run(&self, limits: CrawlLimits) -> CrawlReport {
        let limits = limits.normalized();
        let global = Arc::new(Semaphore::new(limits.max_parallelism));
        let mut domains: HashMap<String, DomainState> = HashMap::new();
        let mut in_flight: JoinSet<Result<PathBuf, TaskError>> = JoinSet::new();
        let mut report = CrawlReport::started();

        tracing::info!(
            "Starting crawl: {} queued, max parallelism {}, per-domain limit {}, timeout {:?}",
            self.queue_size(),
            limits.max_parallelism,
            limits.per_domain_limit,
            limits.request_timeout
        );

        loop {
            if self.shared.is_shutdown() {
                tracing::info!(
                    "Shutdown requested, leaving {} queued tasks unfetched",
                    self.queue_size()
                );
                break;
            }

            // Phase 1: start as many tasks as the limits allow
            let mut retry_after = None;
            while let Ok(global_permit) = global.clone().try_acquire_owned() {
                match self.next_ready(&mut domains, &limits, Instant::now()) {
                    Dispatch::Ready { task, permit } => {
                        let pipeline = Arc::clone(&self.shared.pipeline);
                        let timeout = limits.request_timeout;
                        in_flight.spawn(async move {
                            let _permits = (global_permit, permit);
                            pipeline.process(task, timeout).await
                        });
                    }
                    Dispatch::Wait(wait) => {
                        retry_after = wait;
                        break;
                    }
                }
            }

            // Phase 2: termination
            if in_flight.is_empty() && self.is_empty() {
                tracing::info!("Queue is empty, crawl complete");
                break;
            }

            // Phase 3: wait for something to change
            let pacing = retry_after.unwrap_or(Duration::MAX);
            tokio::select! {
                Some(joined) = in_flight.join_next() => record_outcome(&mut report, joined),
                _ = self.shared.wake.notified() => {}
                _ = tokio::time::sleep(pacing), if retry_after.is_some() => {}
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            record_outcome(&mut report, joined);
        }

        report.record_state_n(
            TaskState::DomainRejected,
            self.shared.rejected.swap(0, Ordering::SeqCst),
        );
        report.finish();

        for (domain, state) in &domains {
            tracing::debug!("{}: {} requests started", domain, state.request_count);
        }

        tracing::info!(
            "Crawl finished: {} written, {} failed or skipped in {:?}",
            report.succeeded(),
            report.failed(),
            report.duration().unwrap_or_default()
        );

        report
    }

    /// Takes the next queued task that may start now
    ///
    /// Only the oldest task of each domain is considered. The returned wait is
    /// the shortest pacing delay among blocked domains; domains blocked only
    /// by their concurrency limit are woken by task completion instead.
    fn next_ready(
        &self,
        domains: &mut HashMap<String, DomainState>,
        limits: &CrawlLimits,
        now: Instant,
    ) -> Dispatch {
        let mut queue = self.shared.queue();
        let mut min_wait: Option<Duration> = None;

        for position in 0..queue.rotation.len() {
            let state = domain_state(domains, &queue.rotation[position], limits);

            if let Some(permit) = state.try_start(limits, now) {
                if let Some(task) = queue.take(position) {
                    return Dispatch::Ready { task, permit };
                }
            }

            if let Some(wait) = state.time_until_next_request(limits, now) {
                min_wait = Some(min_wait.map_or(wait, |current| current.min(wait)));
            }
        }

        Dispatch::Wait(min_wait)
    }
}

impl std::fmt::Debug for FetchScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchScheduler")
            .field("allow_list", &self.shared.allow_list)
            .field("queued", &self.queue_size())
            .field("pipeline", &self.shared.pipeline)
            .finish()
    }
}

fn domain_state<'a>(
    domains: &'a mut HashMap<String, DomainState>,
    domain: &str,
    limits: &CrawlLimits,
) -> &'a mut DomainState {
    domains
        .entry(domain.to_string())
        .or_insert_with(|| DomainState::new(limits.per_domain_limit))
}

fn record_outcome(report: &mut CrawlReport, joined: Result<Result<PathBuf, TaskError>, JoinError>) {
    match joined {
        Ok(Ok(path)) => report.record_written(path),
        Ok(Err(error)) => report.record_error(&error),
        Err(e) => tracing::error!("Fetch task aborted: {}", e),
    }
}
