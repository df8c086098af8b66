//! Google Custom Search JSON API client.
//!
//! <https://developers.google.com/custom-search/v1/reference/rest/v1/cse/list>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{SearchError, SearchHit, SearchProvider, SearchRequest};
use crate::config::SearchConfig;

const CSE_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// The API returns at most ten results per call.
const MAX_RESULTS_PER_CALL: u8 = 10;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Google Custom Search client.
pub struct GoogleSearchClient {
    client: Client,
    api_key: SecretString,
    cx: String,
}

impl GoogleSearchClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Http` if the HTTP client can't be built.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            cx: config.cx.clone(),
        })
    }
}

#[async_trait]
impl SearchProvider for GoogleSearchClient {
    #[tracing::instrument(skip(self), fields(q = %request.effective_query()))]
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, SearchError> {
        let num = request.num.clamp(1, MAX_RESULTS_PER_CALL).to_string();
        let query = request.effective_query();

        let response = self
            .client
            .get(CSE_ENDPOINT)
            .query(&[
                ("key", self.api_key.expose_secret()),
                ("cx", self.cx.as_str()),
                ("q", query.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let body = response.text().await?;
        let hits = parse_response(&body)?;
        tracing::debug!(hits = hits.len(), "Search call complete");
        Ok(hits)
    }

    fn name(&self) -> &'static str {
        "google-cse"
    }
}

/// Map a non-success status to an error.
fn status_error(status: StatusCode, body: String) -> SearchError {
    match status {
        StatusCode::TOO_MANY_REQUESTS | StatusCode::FORBIDDEN => SearchError::Quota {
            status: status.as_u16(),
        },
        _ => SearchError::Api {
            status: status.as_u16(),
            message: body,
        },
    }
}

#[derive(Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CseItem {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
    display_link: Option<String>,
}

/// Decode a response body. Items without a title or link are skipped; a
/// response without `items` means no results.
fn parse_response(body: &str) -> Result<Vec<SearchHit>, SearchError> {
    let response: CseResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Decode(e.to_string()))?;

    Ok(response
        .items
        .into_iter()
        .filter_map(|item| {
            Some(SearchHit {
                title: item.title?,
                link: item.link?,
                snippet: item.snippet,
                display_link: item.display_link,
            })
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_items() {
        let body = r#"{
            "kind": "customsearch#search",
            "items": [
                {
                    "title": "Great Value Large White Eggs, 12 Count",
                    "link": "https://www.walmart.com/ip/145051970",
                    "displayLink": "www.walmart.com",
                    "snippet": "Great Value Large White Eggs ... $3.12"
                },
                { "title": "No link here" },
                {
                    "title": "Eggs - 12ct - Good & Gather",
                    "link": "https://www.target.com/p/-/A-14713534"
                }
            ]
        }"#;

        let hits = parse_response(body).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].display_link.as_deref(), Some("www.walmart.com"));
        assert_eq!(
            hits[0].snippet.as_deref(),
            Some("Great Value Large White Eggs ... $3.12")
        );
        assert_eq!(hits[1].link, "https://www.target.com/p/-/A-14713534");
        assert!(hits[1].snippet.is_none());
    }

    #[test]
    fn test_parse_response_without_items() {
        let hits = parse_response(r#"{"kind":"customsearch#search"}"#).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_parse_response_rejects_garbage() {
        assert!(matches!(
            parse_response("<html>"),
            Err(SearchError::Decode(_))
        ));
    }

    #[test]
    fn test_status_errors() {
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, String::new()),
            SearchError::Quota { status: 429 }
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, String::new()),
            SearchError::Quota { status: 403 }
        ));
        match status_error(StatusCode::BAD_REQUEST, "bad cx".to_string()) {
            SearchError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad cx");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
