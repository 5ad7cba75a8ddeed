//! Error types for fetching and output operations
//!
//! Fetch failures are never fatal to a run: the scheduler and the discoverer
//! log them and move on. They still carry the URL that failed so the log
//! line is useful when a target is flaky.

use std::path::PathBuf;

/// Errors that can occur while fetching a page or a script
///
/// # Examples
///
/// ```ignore
/// use linkfinder::FetchError;
///
/// match fetcher.fetch_script(url).await {
///     Ok(body) => println!("{} bytes", body.len()),
///     Err(FetchError::Status { url, status }) => {
///         eprintln!("{} answered with {}", url, status);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request failed before a response arrived
    ///
    /// Covers DNS, connect and TLS failures.
    #[error("Request to '{url}' failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The request did not complete within the client timeout
    #[error("Request to '{url}' timed out")]
    Timeout { url: String },

    /// The server answered with a non-success status code
    #[error("Request to '{url}' returned status {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be read
    #[error("Failed to read body of '{url}': {message}")]
    Body { url: String, message: String },
}

impl FetchError {
    /// Map a reqwest error for `url` onto the matching variant
    pub fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = error.status() {
            Self::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else if error.is_body() || error.is_decode() {
            Self::Body {
                url: url.to_string(),
                message: error.to_string(),
            }
        } else {
            Self::Request {
                url: url.to_string(),
                source: error,
            }
        }
    }
}

/// Errors that can occur while emitting results
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// The output file could not be created
    #[error("Failed to create output file '{}': {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing a line failed
    #[error("Failed to write results: {0}")]
    Write(#[from] std::io::Error),

    /// A record could not be serialized
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}
