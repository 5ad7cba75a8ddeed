//! Bounded-concurrency script fetching
//!
//! This module provides the [`Scheduler`], which takes a list of script URLs and
//! fetches them with:
//! - **Bounded concurrency**: at most `concurrency` requests in flight
//! - **A shared deadline**: when it passes, in-flight and unstarted requests are
//!   abandoned and whatever was already collected is kept
//! - **Failure isolation**: a failed request is logged and dropped, nothing else
//!   is affected
//! - **Observability**: progress events through the observer pattern
//!
//! Each successful body goes through the [`Extractor`] and every match is
//! appended to a [`ResultSink`].
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```ignore
//! use linkfinder::{Aggregator, Deadline, HttpFetcher, Scheduler};
//! use std::{sync::Arc, time::Duration};
//!
//! let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(10))?);
//! let results = Arc::new(Aggregator::new());
//!
//! let scheduler = Scheduler::builder().concurrency(10).build()?;
//! let stats = scheduler
//!     .fetch_all(fetcher, urls, results.clone(), Deadline::after(Duration::from_secs(10)))
//!     .await;
//! println!("Fetched {} scripts", stats.urls_fetched);
//! ```
//!
//! ## With Observer
//!
//! ```ignore
//! use linkfinder::{FetchObserver, Scheduler};
//! use std::sync::Arc;
//!
//! struct MyObserver;
//!
//! #[async_trait::async_trait]
//! impl FetchObserver for MyObserver {
//!     async fn on_fetch_succeeded(&self, url: &str, matches: usize) {
//!         println!("{url}: {matches} matches");
//!     }
//! }
//!
//! let scheduler = Scheduler::builder()
//!     .observe_with(Arc::new(MyObserver))
//!     .build()?;
//! ```

use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use futures_util::StreamExt;
use tokio::{
    sync::mpsc,
    time::{Instant, sleep_until},
};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::{
    aggregate::ResultSink,
    config::{ConfigError, DEFAULT_CONCURRENCY},
    extract::Extractor,
    fetch::Fetcher,
};

// Configuration constants
const DEFAULT_QUEUE_MULTIPLIER: usize = 100;

/// Upper bound on the task queue, whatever concurrency and multiplier ask for
pub const MAX_QUEUE_CAPACITY: usize = 1 << 16;

/// Cancellation context shared by every request of one fetch phase
///
/// A deadline expires either when its optional expiry instant passes or when
/// its cancellation token is cancelled, whichever comes first. Cloning shares
/// the same token.
#[derive(Debug, Clone)]
pub struct Deadline {
    token: CancellationToken,
    expires_at: Option<Instant>,
}

impl Deadline {
    /// A deadline that expires `timeout` from now
    pub fn after(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            expires_at: Some(Instant::now() + timeout),
        }
    }

    /// A deadline that only expires when cancelled
    pub fn never() -> Self {
        Self {
            token: CancellationToken::new(),
            expires_at: None,
        }
    }

    /// A deadline that expires after `timeout` or when `parent` is cancelled
    pub fn child_of(parent: &CancellationToken, timeout: Duration) -> Self {
        Self {
            token: parent.child_token(),
            expires_at: Some(Instant::now() + timeout),
        }
    }

    /// Expire the deadline immediately
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the deadline has already passed
    pub fn is_expired(&self) -> bool {
        self.token.is_cancelled() || self.expires_at.is_some_and(|at| Instant::now() >= at)
    }

    /// Wait until the deadline passes
    pub async fn expired(&self) {
        match self.expires_at {
            Some(at) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = sleep_until(at) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }
}

/// Observer trait for receiving fetch events
///
/// Implement this trait to report progress or collect custom metrics.
///
/// # Example
///
/// ```ignore
/// use linkfinder::FetchObserver;
///
/// struct FailureLogger;
///
/// #[async_trait::async_trait]
/// impl FetchObserver for FailureLogger {
///     async fn on_fetch_failed(&self, url: &str, error: &str) {
///         eprintln!("{url}: {error}");
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait FetchObserver: Send + Sync {
    /// Called when a URL is handed to the worker queue
    async fn on_url_queued(&self, _url: &str) {}

    /// Called when a body was fetched and scanned
    async fn on_fetch_succeeded(&self, _url: &str, _matches: usize) {}

    /// Called when a request failed
    async fn on_fetch_failed(&self, _url: &str, _error: &str) {}

    /// Called when a request was dropped because the deadline passed
    async fn on_fetch_abandoned(&self, _url: &str) {}

    /// Called once every submitted URL is resolved
    async fn on_fetch_complete(&self, _stats: &FetchStats) {}
}

/// Registry for managing multiple fetch observers
pub struct ObserverRegistry {
    observers: Vec<Arc<dyn FetchObserver>>,
}

impl ObserverRegistry {
    /// Create a new empty ObserverRegistry
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Register an observer to receive fetch events
    pub fn register(&mut self, observer: Arc<dyn FetchObserver>) {
        self.observers.push(observer);
    }

    /// Number of registered observers
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observer is registered
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Notify all observers that a URL was queued
    pub async fn notify_url_queued(&self, url: &str) {
        for observer in &self.observers {
            observer.on_url_queued(url).await;
        }
    }

    /// Notify all observers that a fetch succeeded
    pub async fn notify_fetch_succeeded(&self, url: &str, matches: usize) {
        for observer in &self.observers {
            observer.on_fetch_succeeded(url, matches).await;
        }
    }

    /// Notify all observers that a fetch failed
    pub async fn notify_fetch_failed(&self, url: &str, error: &str) {
        for observer in &self.observers {
            observer.on_fetch_failed(url, error).await;
        }
    }

    /// Notify all observers that a fetch was abandoned
    pub async fn notify_fetch_abandoned(&self, url: &str) {
        for observer in &self.observers {
            observer.on_fetch_abandoned(url).await;
        }
    }

    /// Notify all observers that the fetch phase completed
    pub async fn notify_fetch_complete(&self, stats: &FetchStats) {
        for observer in &self.observers {
            observer.on_fetch_complete(stats).await;
        }
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Validated configuration for the scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub(crate) concurrency: usize,
    pub(crate) queue_multiplier: usize,
}

impl SchedulerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(0));
        }
        if self.queue_multiplier == 0 {
            return Err(ConfigError::InvalidQueueMultiplier(0));
        }
        Ok(())
    }

    /// Maximum number of requests in flight
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Get the task queue capacity, capped at [`MAX_QUEUE_CAPACITY`]
    pub fn queue_capacity(&self) -> usize {
        self.concurrency
            .saturating_mul(self.queue_multiplier)
            .min(MAX_QUEUE_CAPACITY)
    }
}

/// Statistics for one fetch phase
#[derive(Debug, Clone)]
pub struct FetchStats {
    /// Distinct URLs submitted
    pub urls_submitted: usize,
    /// URLs whose body was fetched and scanned
    pub urls_fetched: usize,
    /// URLs whose request failed
    pub urls_failed: usize,
    /// URLs dropped because the deadline passed
    pub urls_abandoned: usize,
    /// Matches appended to the sink
    pub matches_found: usize,
    /// When the phase started
    pub start_time: std::time::Instant,
    /// When these stats were last updated
    pub last_update: std::time::Instant,
}

impl FetchStats {
    /// Create new FetchStats with current timestamp
    pub fn new() -> Self {
        let now = std::time::Instant::now();
        Self {
            urls_submitted: 0,
            urls_fetched: 0,
            urls_failed: 0,
            urls_abandoned: 0,
            matches_found: 0,
            start_time: now,
            last_update: now,
        }
    }

    /// Get elapsed time since the phase started
    pub fn elapsed(&self) -> Duration {
        self.last_update.duration_since(self.start_time)
    }

    /// Number of URLs that reached a final state
    pub fn urls_resolved(&self) -> usize {
        self.urls_fetched + self.urls_failed + self.urls_abandoned
    }

    /// Fold the counters of another phase into this one
    pub fn absorb(&mut self, other: &FetchStats) {
        self.urls_submitted += other.urls_submitted;
        self.urls_fetched += other.urls_fetched;
        self.urls_failed += other.urls_failed;
        self.urls_abandoned += other.urls_abandoned;
        self.matches_found += other.matches_found;
        self.start_time = self.start_time.min(other.start_time);
        self.last_update = self.last_update.max(other.last_update);
    }
}

impl Default for FetchStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe statistics tracker shared by the workers of one phase
pub struct StatsTracker {
    urls_submitted: AtomicUsize,
    urls_fetched: AtomicUsize,
    urls_failed: AtomicUsize,
    urls_abandoned: AtomicUsize,
    matches_found: AtomicUsize,
    start_time: std::time::Instant,
}

impl StatsTracker {
    /// Create a new StatsTracker
    pub fn new() -> Self {
        Self {
            urls_submitted: AtomicUsize::new(0),
            urls_fetched: AtomicUsize::new(0),
            urls_failed: AtomicUsize::new(0),
            urls_abandoned: AtomicUsize::new(0),
            matches_found: AtomicUsize::new(0),
            start_time: std::time::Instant::now(),
        }
    }

    // Counters are informational only, Relaxed ordering is enough

    /// Record submitted URLs
    pub fn urls_submitted(&self, count: usize) {
        self.urls_submitted.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a successful fetch and the number of matches it produced
    pub fn url_fetched(&self, matches: usize) {
        self.urls_fetched.fetch_add(1, Ordering::Relaxed);
        self.matches_found.fetch_add(matches, Ordering::Relaxed);
    }

    /// Record a failed fetch
    pub fn url_failed(&self) {
        self.urls_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an abandoned fetch
    pub fn url_abandoned(&self) {
        self.urls_abandoned.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics
    pub fn snapshot(&self) -> FetchStats {
        FetchStats {
            urls_submitted: self.urls_submitted.load(Ordering::Relaxed),
            urls_fetched: self.urls_fetched.load(Ordering::Relaxed),
            urls_failed: self.urls_failed.load(Ordering::Relaxed),
            urls_abandoned: self.urls_abandoned.load(Ordering::Relaxed),
            matches_found: self.matches_found.load(Ordering::Relaxed),
            start_time: self.start_time,
            last_update: std::time::Instant::now(),
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetch scheduler with a bounded worker pool
///
/// A call to [`fetch_all`](Self::fetch_all) runs one fetch phase:
/// - A feeder hands URLs to a bounded task queue until the list is exhausted
///   or the deadline passes
/// - Up to `concurrency` workers pull from the queue, fetch, and scan bodies
/// - The call returns once every URL is fetched, failed, or abandoned
pub struct Scheduler {
    config: SchedulerConfig,
    extractor: Arc<Extractor>,
    observers: Arc<ObserverRegistry>,
}

impl Scheduler {
    /// Create a new scheduler with default settings
    pub fn new() -> Self {
        Self::builder()
            .build()
            .expect("Default configuration should be valid")
    }

    /// Create a scheduler builder for custom configuration
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::default()
    }

    /// The validated configuration
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    fn new_with_config(
        config: SchedulerConfig,
        extractor: Extractor,
        observers: Vec<Arc<dyn FetchObserver>>,
    ) -> Self {
        let mut registry = ObserverRegistry::new();
        for observer in observers {
            registry.register(observer);
        }

        Self {
            config,
            extractor: Arc::new(extractor),
            observers: Arc::new(registry),
        }
    }

    /// Fetch every URL, scan each body, and append matches to `results`
    ///
    /// Duplicate URLs are fetched once. The call blocks until every URL has
    /// been resolved. When `deadline` passes, in-flight requests are dropped,
    /// queued ones are never started, and the matches already appended stay.
    ///
    /// # Arguments
    /// * `fetcher` - Source of script bodies
    /// * `urls` - Absolute script URLs
    /// * `results` - Sink receiving `(url, value)` for every match
    /// * `deadline` - Shared cancellation context for the whole phase
    ///
    /// # Returns
    /// Statistics for this phase
    pub async fn fetch_all(
        &self,
        fetcher: Arc<dyn Fetcher>,
        urls: Vec<String>,
        results: Arc<dyn ResultSink>,
        deadline: Deadline,
    ) -> FetchStats {
        let stats = Arc::new(StatsTracker::new());

        let mut queued = HashSet::new();
        let pending: Vec<String> = urls
            .into_iter()
            .filter(|url| queued.insert(url.clone()))
            .collect();
        stats.urls_submitted(pending.len());

        let (tasks_tx, tasks_rx) = mpsc::channel::<String>(self.config.queue_capacity());

        let workers = self.launch_workers(
            fetcher,
            tasks_rx,
            results,
            deadline.clone(),
            stats.clone(),
        );

        let mut unsent = pending.into_iter();
        while let Some(url) = unsent.next() {
            self.observers.notify_url_queued(&url).await;

            let accepted = tokio::select! {
                biased;
                _ = deadline.expired() => false,
                sent = tasks_tx.send(url.clone()) => sent.is_ok(),
            };

            if !accepted {
                self.abandon(&stats, &url).await;
                break;
            }
        }

        // Anything left over was never handed to a worker
        for url in unsent {
            self.observers.notify_url_queued(&url).await;
            self.abandon(&stats, &url).await;
        }

        // Closing the queue lets the workers drain it and finish
        drop(tasks_tx);

        if let Err(e) = workers.await {
            error!(error = %e, "fetch workers terminated abnormally");
        }

        let final_stats = stats.snapshot();
        self.observers.notify_fetch_complete(&final_stats).await;

        final_stats
    }

    async fn abandon(&self, stats: &StatsTracker, url: &str) {
        debug!(url, "deadline reached before request started");
        stats.url_abandoned();
        self.observers.notify_fetch_abandoned(url).await;
    }

    /// Launch the worker pool and return a handle to wait for completion
    fn launch_workers(
        &self,
        fetcher: Arc<dyn Fetcher>,
        tasks: mpsc::Receiver<String>,
        results: Arc<dyn ResultSink>,
        deadline: Deadline,
        stats: Arc<StatsTracker>,
    ) -> tokio::task::JoinHandle<()> {
        let concurrency = self.config.concurrency;
        let extractor = self.extractor.clone();
        let observers = self.observers.clone();

        tokio::spawn(async move {
            ReceiverStream::new(tasks)
                .for_each_concurrent(concurrency, |url| {
                    let fetcher = fetcher.clone();
                    let results = results.clone();
                    let deadline = deadline.clone();
                    let stats = stats.clone();
                    let extractor = extractor.clone();
                    let observers = observers.clone();

                    async move {
                        if deadline.is_expired() {
                            debug!(url = %url, "deadline reached before request started");
                            stats.url_abandoned();
                            observers.notify_fetch_abandoned(&url).await;
                            return;
                        }

                        let outcome = tokio::select! {
                            biased;
                            _ = deadline.expired() => None,
                            result = fetcher.fetch_script(&url) => Some(result),
                        };

                        match outcome {
                            Some(Ok(body)) => {
                                let found = extractor.extract(&body);
                                for value in &found {
                                    results.add(&url, value);
                                }
                                debug!(url = %url, matches = found.len(), "scanned script");
                                stats.url_fetched(found.len());
                                observers.notify_fetch_succeeded(&url, found.len()).await;
                            }
                            Some(Err(err)) => {
                                let error_msg = err.to_string();
                                debug!(url = %url, error = %error_msg, "dropping script");
                                stats.url_failed();
                                observers.notify_fetch_failed(&url, &error_msg).await;
                            }
                            None => {
                                debug!(url = %url, "deadline reached, abandoning request");
                                stats.url_abandoned();
                                observers.notify_fetch_abandoned(&url).await;
                            }
                        }
                    }
                })
                .await;
        })
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for configuring a Scheduler
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    extractor: Option<Extractor>,
    observers: Vec<Arc<dyn FetchObserver>>,
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerBuilder {
    /// Create a new SchedulerBuilder with default settings
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig {
                concurrency: DEFAULT_CONCURRENCY,
                queue_multiplier: DEFAULT_QUEUE_MULTIPLIER,
            },
            extractor: None,
            observers: Vec::new(),
        }
    }

    /// Set the number of concurrent requests (default: 10)
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Set the task queue capacity multiplier (default: 100)
    ///
    /// The actual queue capacity will be `concurrency * multiplier`, capped at
    /// [`MAX_QUEUE_CAPACITY`].
    pub fn queue_multiplier(mut self, multiplier: usize) -> Self {
        self.config.queue_multiplier = multiplier;
        self
    }

    /// Use a custom extractor instead of the built-in pattern
    pub fn extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Register an observer to receive fetch events
    pub fn observe_with(mut self, observer: Arc<dyn FetchObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Build the Scheduler with the configured settings
    pub fn build(self) -> Result<Scheduler, ConfigError> {
        self.config.validate()?;
        let extractor = self.extractor.unwrap_or_default();
        Ok(Scheduler::new_with_config(
            self.config,
            extractor,
            self.observers,
        ))
    }
}
