// Core modules
mod aggregate;
mod backend;
pub mod config;
mod discover;
mod error;
mod extract;
mod fetch;
mod normalize;
pub mod output;
mod runner;
pub mod scheduler;
pub mod telemetry;

// Public exports
pub use aggregate::{Aggregator, MatchResult, ResultSink};
pub use backend::{ElementRef, PageScripts};
pub use config::{ConfigError, SeedCollector, Settings, Verbosity};
pub use discover::Discoverer;
pub use error::{FetchError, OutputError};
pub use extract::{ExtractedMatch, Extractor, FILENAME_EXTENSIONS, Rule};
pub use fetch::{Fetcher, HttpFetcher, USER_AGENT};
pub use normalize::UrlNormalizer;
pub use output::OutputFormat;
pub use runner::{LinkFinder, RunSummary};
pub use scheduler::{
    Deadline, FetchObserver, FetchStats, ObserverRegistry, Scheduler, SchedulerBuilder,
    SchedulerConfig, StatsTracker,
};
