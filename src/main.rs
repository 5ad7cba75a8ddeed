use std::{
    io::{self, IsTerminal},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use linkfinder::{
    Aggregator, FetchObserver, HttpFetcher, LinkFinder, OutputFormat, SeedCollector, Settings,
    Verbosity, output, telemetry::init_telemetry,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "linkfinder",
    version,
    about = "Find script resources on seed pages and extract the endpoints they reference"
)]
struct Args {
    /// A single seed URL or domain
    #[arg(short, long, value_name = "URL")]
    domain: Option<String>,

    /// Path to a file containing newline-separated seeds
    #[arg(short, long, value_name = "FILE")]
    list: Option<PathBuf>,

    /// Also write the results to this file
    #[arg(short, long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Number of scripts fetched concurrently
    #[arg(short, long, value_name = "N", default_value_t = linkfinder::config::DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Seconds allowed for each request and for each seed's fetch phase
    #[arg(short, long, value_name = "SECS", default_value_t = linkfinder::config::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Only keep results containing this substring
    #[arg(short, long, value_name = "SUBSTR")]
    filter: Option<String>,

    /// Output line format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Only print results and errors
    #[arg(short, long, conflicts_with = "verbose")]
    silent: bool,

    /// Log every request outcome
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn settings(&self) -> Settings {
        Settings {
            concurrency: self.concurrency,
            timeout: Duration::from_secs(self.timeout),
            filter: self.filter.clone().filter(|f| !f.is_empty()),
            format: self.format,
            output: self.out.clone(),
            verbosity: Verbosity::from_flags(self.silent, self.verbose),
        }
    }

    fn seeds(&self) -> Result<Vec<String>, linkfinder::ConfigError> {
        let mut seeds = SeedCollector::new();
        if let Some(domain) = &self.domain {
            seeds.push(domain);
        }
        if let Some(list) = &self.list {
            seeds.extend_from_file(list)?;
        }
        seeds.extend_from_stdin()?;
        seeds.finish()
    }
}

/// Progress bar advanced as scripts resolve
struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} scripts {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

#[async_trait::async_trait]
impl FetchObserver for ProgressObserver {
    async fn on_url_queued(&self, _url: &str) {
        self.bar.inc_length(1);
    }

    async fn on_fetch_succeeded(&self, _url: &str, _matches: usize) {
        self.bar.inc(1);
    }

    async fn on_fetch_failed(&self, _url: &str, _error: &str) {
        self.bar.inc(1);
    }

    async fn on_fetch_abandoned(&self, _url: &str) {
        self.bar.inc(1);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = args.settings();
    init_telemetry(settings.verbosity);

    let seeds = args.seeds()?;
    settings.validate()?;

    let fetcher = Arc::new(HttpFetcher::new(settings.timeout).context("Failed to set up HTTP")?);

    let progress = (settings.verbosity != Verbosity::Silent && io::stderr().is_terminal())
        .then(|| Arc::new(ProgressObserver::new()));
    let observers: Vec<Arc<dyn FetchObserver>> = progress
        .iter()
        .map(|p| p.clone() as Arc<dyn FetchObserver>)
        .collect();

    let finder = LinkFinder::with_observers(fetcher, &settings, observers)?;
    let results = Arc::new(match &settings.filter {
        Some(filter) => Aggregator::with_filter(filter.as_str()),
        None => Aggregator::new(),
    });

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, finishing with the results gathered so far");
            ctrl_c.cancel();
        }
    });

    let summary = finder.run(&seeds, results.clone(), &cancel).await;
    if let Some(progress) = &progress {
        progress.finish();
    }

    let records = results.finalize_records();
    info!(
        seeds = summary.seeds_processed,
        scripts = summary.scripts_discovered,
        results = records.len(),
        elapsed_ms = summary.fetch.elapsed().as_millis() as u64,
        "done"
    );

    output::write_results(&mut io::stdout().lock(), &records, settings.format)
        .context("Failed to print results")?;

    if let Some(path) = &settings.output {
        output::write_results_to_file(path, &records, settings.format)
            .with_context(|| format!("Failed to write results to {}", path.display()))?;
    }

    Ok(())
}
