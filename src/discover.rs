//! Script discovery on seed pages

use std::{collections::HashSet, sync::Arc};

use tracing::{debug, warn};

use crate::{
    aggregate::ResultSink,
    backend::PageScripts,
    extract::Extractor,
    fetch::Fetcher,
    normalize::{UrlNormalizer, strip_quotes},
};

/// Finds the scripts a seed page loads
///
/// One plain GET per seed. Failures never propagate: a seed that cannot be
/// fetched or parsed simply contributes no scripts.
pub struct Discoverer {
    fetcher: Arc<dyn Fetcher>,
    extractor: Extractor,
}

impl Discoverer {
    /// Create a discoverer using the built-in extraction pattern
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self::with_extractor(fetcher, Extractor::default())
    }

    /// Create a discoverer with a custom extractor
    pub fn with_extractor(fetcher: Arc<dyn Fetcher>, extractor: Extractor) -> Self {
        Self { fetcher, extractor }
    }

    /// Fetch `seed_url` and return the absolute URLs of the scripts it references
    ///
    /// Every match found in the page itself is recorded in `results` with the
    /// seed as its source. Script candidates are the `src` attributes of
    /// `<script>` elements plus page matches mentioning `.js`; they are
    /// deduplicated and resolved against the seed's base URL, and whatever
    /// cannot be resolved is dropped.
    pub async fn discover(&self, seed_url: &str, results: &dyn ResultSink) -> Vec<String> {
        let body = match self.fetcher.fetch_page(seed_url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(seed = seed_url, error = %e, "failed to fetch seed page");
                return Vec::new();
            }
        };

        if body.trim().is_empty() {
            warn!(seed = seed_url, "seed page has an empty body");
            return Vec::new();
        }

        let scripts = PageScripts::parse(&body);

        let mut page_matches = self.extractor.extract(&scripts.inline_text);
        page_matches.extend(self.extractor.extract(&body));
        for value in &page_matches {
            results.add(seed_url, value);
        }

        let candidates = scripts.sources.into_iter().chain(
            page_matches
                .iter()
                .map(|value| strip_quotes(value))
                .filter(|value| value.contains(".js")),
        );

        let base_url = UrlNormalizer::base_url(seed_url);
        let mut seen_references = HashSet::new();
        let mut seen_urls = HashSet::new();
        let script_urls: Vec<String> = candidates
            .filter(|reference| seen_references.insert(reference.clone()))
            .filter_map(|reference| UrlNormalizer::resolve(&reference, &base_url))
            .filter(|url| seen_urls.insert(url.clone()))
            .collect();

        debug!(
            seed = seed_url,
            page_matches = page_matches.len(),
            scripts = script_urls.len(),
            "discovered scripts"
        );

        script_urls
    }
}
