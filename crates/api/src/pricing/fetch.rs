//! Product page fetching.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

/// Per-page timeout.
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// User agent sent with page requests.
pub const USER_AGENT: &str = "PriceComparer/1.0";

/// Errors fetching a page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network failure, timeout or unreadable body.
    #[error("page request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("page returned status {0}")]
    Status(u16),
}

/// Downloads product pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return the body as text.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// `reqwest`-backed page fetcher.
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    /// Create a fetcher with the page timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client can't be built.
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(PAGE_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

/// Whether a link may be fetched: absolute `http` or `https` URLs only.
#[must_use]
pub fn is_fetchable(link: &str) -> bool {
    url::Url::parse(link).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}
