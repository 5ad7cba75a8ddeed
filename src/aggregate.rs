//! Collection of matches produced by concurrent workers

use std::collections::HashSet;

use parking_lot::Mutex;
use serde::Serialize;

use crate::normalize::strip_quotes;

/// One matched value and the URL whose body it was found in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    /// The page or script the value was found in
    pub url: String,
    /// The matched text
    pub value: String,
}

impl MatchResult {
    /// Create a new MatchResult
    pub fn new(url: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            value: value.into(),
        }
    }
}

/// Destination for matches found while fetching
///
/// The scheduler and discoverer only ever append, so this is all they see of
/// the [`Aggregator`]. Tests substitute their own sinks.
pub trait ResultSink: Send + Sync {
    /// Record that `value` was found in the body of `source`
    fn add(&self, source: &str, value: &str);
}

/// Thread-safe, append-only collector of [`MatchResult`]s
///
/// Appends take the lock only for the duration of a `Vec::push`. Once all
/// fetches are done, [`finalize`](Self::finalize) produces the deduplicated
/// and filtered output.
#[derive(Debug, Default)]
pub struct Aggregator {
    entries: Mutex<Vec<MatchResult>>,
    filter: Option<String>,
}

impl Aggregator {
    /// Create an aggregator without a filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an aggregator that only keeps values containing `filter`
    ///
    /// An empty filter keeps everything.
    pub fn with_filter(filter: impl Into<String>) -> Self {
        let filter = filter.into();
        Self {
            entries: Mutex::new(Vec::new()),
            filter: (!filter.is_empty()).then_some(filter),
        }
    }

    /// Number of raw matches collected so far, duplicates included
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing has been collected yet
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Copy of every raw match in append order
    pub fn snapshot(&self) -> Vec<MatchResult> {
        self.entries.lock().clone()
    }

    /// Final list of values: quotes stripped, duplicates removed, filter applied
    ///
    /// First-seen order is preserved.
    pub fn finalize(&self) -> Vec<String> {
        self.finalize_records()
            .into_iter()
            .map(|record| record.value)
            .collect()
    }

    /// Same as [`finalize`](Self::finalize), keeping the source of the first
    /// occurrence of each value
    pub fn finalize_records(&self) -> Vec<MatchResult> {
        let entries = self.snapshot();
        let mut seen = HashSet::new();

        entries
            .into_iter()
            .filter_map(|entry| {
                let value = strip_quotes(&entry.value);
                if value.is_empty() || !seen.insert(value.clone()) {
                    return None;
                }
                if let Some(filter) = &self.filter
                    && !value.contains(filter.as_str())
                {
                    return None;
                }
                Some(MatchResult::new(entry.url, value))
            })
            .collect()
    }
}

impl ResultSink for Aggregator {
    fn add(&self, source: &str, value: &str) {
        let record = MatchResult::new(source, value);
        self.entries.lock().push(record);
    }
}
