//! Drives seeds through discovery and fetching

use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    aggregate::ResultSink,
    config::{ConfigError, Settings},
    discover::Discoverer,
    extract::Extractor,
    fetch::Fetcher,
    normalize::UrlNormalizer,
    scheduler::{Deadline, FetchObserver, FetchStats, Scheduler},
};

/// Totals for a whole run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Seeds whose page was requested
    pub seeds_processed: usize,
    /// Script URLs handed to the scheduler
    pub scripts_discovered: usize,
    /// Fetch statistics summed over every seed
    pub fetch: FetchStats,
}

/// Processes seeds one at a time
///
/// For each seed: normalize it, discover its scripts, then fetch them all
/// under a fresh deadline. Matches from the page and from the scripts go to
/// the same sink.
pub struct LinkFinder {
    fetcher: Arc<dyn Fetcher>,
    discoverer: Discoverer,
    scheduler: Scheduler,
    timeout: Duration,
}

impl LinkFinder {
    /// Create a link finder from validated settings
    pub fn new(fetcher: Arc<dyn Fetcher>, settings: &Settings) -> Result<Self, ConfigError> {
        Self::with_observers(fetcher, settings, Vec::new())
    }

    /// Create a link finder whose scheduler reports to `observers`
    pub fn with_observers(
        fetcher: Arc<dyn Fetcher>,
        settings: &Settings,
        observers: Vec<Arc<dyn FetchObserver>>,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;

        let extractor = Extractor::default();
        let mut builder = Scheduler::builder()
            .concurrency(settings.concurrency)
            .extractor(extractor.clone());
        for observer in observers {
            builder = builder.observe_with(observer);
        }

        Ok(Self {
            discoverer: Discoverer::with_extractor(fetcher.clone(), extractor),
            scheduler: builder.build()?,
            fetcher,
            timeout: settings.timeout,
        })
    }

    /// Run every seed, stopping early if `cancel` fires
    ///
    /// Cancellation ends the current fetch phase and skips the remaining
    /// seeds; matches collected up to that point stay in `results`.
    pub async fn run(
        &self,
        seeds: &[String],
        results: Arc<dyn ResultSink>,
        cancel: &CancellationToken,
    ) -> RunSummary {
        let mut summary = RunSummary::default();

        for seed in seeds {
            if cancel.is_cancelled() {
                info!("run cancelled, skipping remaining seeds");
                break;
            }

            let seed_url = UrlNormalizer::normalize(seed);
            info!(seed = %seed_url, "processing");

            let scripts = self.discoverer.discover(&seed_url, results.as_ref()).await;
            summary.seeds_processed += 1;
            summary.scripts_discovered += scripts.len();

            if scripts.is_empty() {
                continue;
            }

            let deadline = Deadline::child_of(cancel, self.timeout);
            let stats = self
                .scheduler
                .fetch_all(self.fetcher.clone(), scripts, results.clone(), deadline)
                .await;

            info!(
                seed = %seed_url,
                fetched = stats.urls_fetched,
                failed = stats.urls_failed,
                abandoned = stats.urls_abandoned,
                matches = stats.matches_found,
                "finished fetching scripts"
            );
            summary.fetch.absorb(&stats);
        }

        summary
    }
}
