//! HTTP access used by discovery and the fetch scheduler

use std::time::Duration;

use reqwest::{Client, Response};
use tracing::debug;

use crate::error::FetchError;

/// Identifying `User-Agent` sent with every script request
pub const USER_AGENT: &str = concat!("linkfinder/", env!("CARGO_PKG_VERSION"));

/// Trait for retrieving page and script bodies
///
/// The two methods differ only in the headers they send: seed pages are
/// requested plainly, scripts carry [`USER_AGENT`].
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a seed page and return its body as text
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;

    /// Fetch a script resource and return its body as text
    async fn fetch_script(&self, url: &str) -> Result<String, FetchError>;
}

/// [`Fetcher`] backed by `reqwest`
///
/// Both clients share the configured timeout. Seed pages are returned whatever
/// the status code; a non-2xx script response is a [`FetchError::Status`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    page_client: Client,
    script_client: Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let page_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        let script_client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            page_client,
            script_client,
        })
    }

    async fn send(client: &Client, url: &str) -> Result<Response, FetchError> {
        client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))
    }

    async fn read_body(response: Response, url: &str) -> Result<String, FetchError> {
        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let response = Self::send(&self.page_client, url).await?;

        // Error pages still carry markup worth scanning
        let status = response.status();
        if !status.is_success() {
            debug!(url, status = status.as_u16(), "seed page returned an error status");
        }

        Self::read_body(response, url).await
    }

    async fn fetch_script(&self, url: &str) -> Result<String, FetchError> {
        let response = Self::send(&self.script_client, url).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Self::read_body(response, url).await
    }
}
