//! Web search adapters and the multi-site fan-out.
//!
//! A query is sent once unscoped and once per site filter
//! (`site:<domain> <query>`). Calls run concurrently; a failed call is logged
//! and skipped so the remaining results are still usable.

pub mod google;
pub mod sites;

use async_trait::async_trait;
use futures::future::join_all;
use thiserror::Error;

use crate::models::PriceCandidate;

pub use google::GoogleSearchClient;
pub use sites::{SiteSelector, sites_for_zipcode};

/// Errors from a single search call.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Network failure or timeout.
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Daily quota exhausted or key not allowed.
    #[error("search quota exceeded (status {status})")]
    Quota {
        /// HTTP status returned by the API.
        status: u16,
    },

    /// Any other non-success status.
    #[error("search API error {status}: {message}")]
    Api {
        /// HTTP status returned by the API.
        status: u16,
        /// Response body.
        message: String,
    },

    /// Response body didn't match the expected shape.
    #[error("invalid search response: {0}")]
    Decode(String),
}

/// One search call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Free-text query.
    pub query: String,
    /// Domain to restrict results to.
    pub site: Option<String>,
    /// Results wanted.
    pub num: u8,
}

impl SearchRequest {
    /// A search across the whole engine.
    #[must_use]
    pub fn unscoped(query: &str, num: u8) -> Self {
        Self {
            query: query.to_owned(),
            site: None,
            num,
        }
    }

    /// A search restricted to one domain.
    #[must_use]
    pub fn scoped(query: &str, site: &str, num: u8) -> Self {
        Self {
            query: query.to_owned(),
            site: Some(site.to_owned()),
            num,
        }
    }

    /// Query text sent to the engine.
    #[must_use]
    pub fn effective_query(&self) -> String {
        match &self.site {
            Some(site) => format!("site:{site} {}", self.query),
            None => self.query.clone(),
        }
    }
}

/// A raw search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Result title.
    pub title: String,
    /// Result URL.
    pub link: String,
    /// Result snippet.
    pub snippet: Option<String>,
    /// Domain shown by the engine (e.g. `www.walmart.com`).
    pub display_link: Option<String>,
}

/// A web search backend.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one search.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, SearchError>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}

/// Result counts for the fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanOutLimits {
    /// Results for the unscoped call.
    pub per_query: u8,
    /// Results for each site-scoped call.
    pub per_site: u8,
}

impl Default for FanOutLimits {
    fn default() -> Self {
        Self {
            per_query: 5,
            per_site: 3,
        }
    }
}

/// Search `query` unscoped plus once per site, concurrently.
///
/// Candidates come back in request order (unscoped first, then sites in the
/// given order), each response keeping its own item order. Failed calls are
/// logged and contribute nothing.
#[tracing::instrument(
    skip(provider, sites),
    fields(provider = provider.name(), sites = sites.len())
)]
pub async fn fan_out(
    provider: &dyn SearchProvider,
    query: &str,
    sites: &[String],
    limits: FanOutLimits,
) -> Vec<PriceCandidate> {
    let unscoped = SearchRequest::unscoped(query, limits.per_query);
    let requests: Vec<SearchRequest> = std::iter::once(unscoped)
        .chain(
            sites
                .iter()
                .map(|site| SearchRequest::scoped(query, site, limits.per_site)),
        )
        .collect();

    let responses = join_all(requests.iter().map(|request| provider.search(request))).await;

    let mut candidates = Vec::new();
    for (request, response) in requests.iter().zip(responses) {
        match response {
            Ok(hits) => candidates.extend(hits.into_iter().map(|hit| to_candidate(request, hit))),
            Err(e) => tracing::warn!(
                site = request.site.as_deref().unwrap_or("*"),
                error = %e,
                "Search call failed, skipping"
            ),
        }
    }
    candidates
}

/// Turn a hit into a candidate.
///
/// Scoped calls credit the filter's domain; unscoped calls credit the engine's
/// display domain, or the link's host when the engine gave none.
fn to_candidate(request: &SearchRequest, hit: SearchHit) -> PriceCandidate {
    let source = request
        .site
        .clone()
        .or(hit.display_link)
        .or_else(|| {
            url::Url::parse(&hit.link)
                .ok()
                .and_then(|u| u.host_str().map(str::to_owned))
        })
        .unwrap_or_default();

    PriceCandidate {
        title: hit.title,
        link: hit.link,
        snippet: hit.snippet,
        source,
    }
}
