//! Seed and script reference normalization

use url::Url;

/// Shortest reference that can still name a script (`/a.js`)
const MIN_REFERENCE_LEN: usize = 5;

/// Utility for turning seeds and discovered references into fetchable URLs
pub struct UrlNormalizer;

impl UrlNormalizer {
    /// Normalize a seed domain into a fully-qualified URL
    ///
    /// Inputs already carrying an `http://` or `https://` scheme are returned
    /// unchanged, everything else is assumed to be a bare host and gets
    /// `https://` prepended.
    pub fn normalize(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        }
    }

    /// Reduce a seed to its base URL: scheme and host, without any path
    ///
    /// A non-default port is kept. Seeds the `url` crate cannot parse fall
    /// back to the normalized seed minus any trailing slash.
    pub fn base_url(seed: &str) -> String {
        let normalized = Self::normalize(seed);
        match Url::parse(&normalized) {
            Ok(parsed) if parsed.has_host() => parsed.origin().ascii_serialization(),
            _ => normalized.trim_end_matches('/').to_string(),
        }
    }

    /// Resolve a discovered script reference against a base URL
    ///
    /// Returns `None` for references that cannot be a script path or whose
    /// form is not understood. Discarding is not an error.
    pub fn resolve(reference: &str, base_url: &str) -> Option<String> {
        let cleaned = strip_quotes(reference);
        let cleaned = cleaned.trim();

        if cleaned.len() < MIN_REFERENCE_LEN || !cleaned.contains(".js") {
            return None;
        }

        if cleaned.starts_with("http://") || cleaned.starts_with("https://") {
            Some(cleaned.to_string())
        } else if cleaned.starts_with("//") {
            Some(format!("https:{cleaned}"))
        } else if cleaned.starts_with('/') {
            Some(format!("{}{}", base_url.trim_end_matches('/'), cleaned))
        } else {
            None
        }
    }
}

/// Remove every single and double quote character
pub(crate) fn strip_quotes(value: &str) -> String {
    value.chars().filter(|c| !matches!(c, '"' | '\'')).collect()
}
