//! Run settings and seed collection
//!
//! Seeds can come from a single flag, a list file, and piped standard input.
//! They are merged in that order, trimmed, and deduplicated. An empty result is
//! a configuration error: a run never starts without at least one seed.

use std::{
    collections::HashSet,
    io::{BufRead, BufReader, IsTerminal},
    path::{Path, PathBuf},
    time::Duration,
};

use crate::output::OutputFormat;

pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Errors that can occur while assembling the run configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Concurrency must be greater than 0
    #[error("Concurrency must be greater than 0, got {0}")]
    InvalidConcurrency(usize),

    /// Queue multiplier must be greater than 0
    #[error("Queue multiplier must be greater than 0, got {0}")]
    InvalidQueueMultiplier(usize),

    /// Timeout must be greater than 0
    #[error("Timeout must be greater than 0 seconds")]
    InvalidTimeout,

    /// No seed was supplied through any input
    #[error("No domains provided. Use -d, -l, or pipe input via stdin.")]
    NoSeeds,

    /// The seed list file could not be read
    #[error("Failed to read list file '{}': {source}", path.display())]
    SeedList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Standard input could not be read
    #[error("Failed to read seeds from stdin: {0}")]
    Stdin(#[source] std::io::Error),
}

/// How much the run reports on stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only, no progress bar
    Silent,
    /// Per-seed progress
    #[default]
    Normal,
    /// Every request outcome
    Verbose,
}

impl Verbosity {
    /// Derive the verbosity from the two CLI toggles; silent wins
    pub fn from_flags(silent: bool, verbose: bool) -> Self {
        if silent {
            Self::Silent
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    /// Default `tracing` filter directive for this verbosity
    pub fn filter_directive(self) -> &'static str {
        match self {
            Self::Silent => "error",
            Self::Normal => "info",
            Self::Verbose => "debug",
        }
    }
}

/// Validated settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    pub concurrency: usize,
    pub timeout: Duration,
    pub filter: Option<String>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub verbosity: Verbosity,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            filter: None,
            format: OutputFormat::Text,
            output: None,
            verbosity: Verbosity::Normal,
        }
    }
}

impl Settings {
    /// Validate the settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(0));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}

/// Accumulates seeds from every input source
#[derive(Debug, Default)]
pub struct SeedCollector {
    seeds: Vec<String>,
}

impl SeedCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single seed
    pub fn push(&mut self, seed: &str) {
        self.seeds.push(seed.to_string());
    }

    /// Add one seed per line of `reader`
    pub fn extend_from_reader<R: BufRead>(&mut self, reader: R) -> std::io::Result<()> {
        for line in reader.lines() {
            self.seeds.push(line?);
        }
        Ok(())
    }

    /// Add one seed per line of the file at `path`
    pub fn extend_from_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let seed_list = |source| ConfigError::SeedList {
            path: path.to_path_buf(),
            source,
        };
        let file = std::fs::File::open(path).map_err(seed_list)?;
        self.extend_from_reader(BufReader::new(file))
            .map_err(seed_list)
    }

    /// Add one seed per line of standard input, if it is piped
    ///
    /// An interactive terminal is left alone.
    pub fn extend_from_stdin(&mut self) -> Result<(), ConfigError> {
        let stdin = std::io::stdin();
        if stdin.is_terminal() {
            return Ok(());
        }
        self.extend_from_reader(stdin.lock())
            .map_err(ConfigError::Stdin)
    }

    /// Trimmed, non-blank, deduplicated seeds in first-seen order
    ///
    /// Fails with [`ConfigError::NoSeeds`] when nothing is left.
    pub fn finish(self) -> Result<Vec<String>, ConfigError> {
        let mut seen = HashSet::new();
        let seeds: Vec<String> = self
            .seeds
            .iter()
            .map(|seed| seed.trim())
            .filter(|seed| !seed.is_empty())
            .filter(|seed| seen.insert(seed.to_string()))
            .map(str::to_string)
            .collect();

        if seeds.is_empty() {
            return Err(ConfigError::NoSeeds);
        }
        Ok(seeds)
    }
}
