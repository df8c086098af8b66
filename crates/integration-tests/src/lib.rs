//! Integration test harness for Price Comparer.
//!
//! [`TestContext`] builds the real router over in-memory stores, a stub
//! search provider, a stub page fetcher and a recording mailer, then drives
//! it with `tower::ServiceExt::oneshot`. The context keeps the session
//! cookie between requests the way a browser would.
//!
//! ```rust,ignore
//! let ctx = TestContext::new(StubSearch::default());
//! let resp = ctx.get("/api/search?query=eggs").await;
//! assert_eq!(resp.status, StatusCode::OK);
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use price_comparer_api::db::{MemoryListStore, MemoryPriceCache, MemoryUserStore};
use price_comparer_api::middleware::create_session_layer;
use price_comparer_api::pricing::{FetchError, PageFetcher};
use price_comparer_api::search::{
    FanOutLimits, SearchError, SearchHit, SearchProvider, SearchRequest, SiteSelector,
};
use price_comparer_api::services::{MailError, Mailer, RenderedEmail};
use price_comparer_api::state::{AppState, StateParts};
use price_comparer_core::Email;

// =============================================================================
// Collaborator doubles
// =============================================================================

/// Canned search results keyed by site; records every request.
#[derive(Default)]
pub struct StubSearch {
    unscoped: Vec<SearchHit>,
    by_site: HashMap<String, Vec<SearchHit>>,
    failing_sites: HashSet<String>,
    calls: Mutex<Vec<SearchRequest>>,
}

impl StubSearch {
    /// Results for the unscoped call.
    #[must_use]
    pub fn unscoped(mut self, hits: Vec<SearchHit>) -> Self {
        self.unscoped = hits;
        self
    }

    /// Results for calls scoped to `site`.
    #[must_use]
    pub fn site(mut self, site: &str, hits: Vec<SearchHit>) -> Self {
        self.by_site.insert(site.to_string(), hits);
        self
    }

    /// Calls scoped to `site` fail with a quota error.
    #[must_use]
    pub fn failing(mut self, site: &str) -> Self {
        self.failing_sites.insert(site.to_string());
        self
    }

    /// Requests received so far.
    pub fn calls(&self) -> Vec<SearchRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for StubSearch {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, SearchError> {
        self.calls.lock().unwrap().push(request.clone());
        match &request.site {
            None => Ok(self.unscoped.clone()),
            Some(site) if self.failing_sites.contains(site) => {
                Err(SearchError::Quota { status: 429 })
            }
            Some(site) => Ok(self.by_site.get(site).cloned().unwrap_or_default()),
        }
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Build a search hit.
pub fn hit(title: &str, link: &str, snippet: &str, display_link: &str) -> SearchHit {
    SearchHit {
        title: title.to_string(),
        link: link.to_string(),
        snippet: Some(snippet.to_string()),
        display_link: Some(display_link.to_string()),
    }
}

/// Serves canned pages; unknown URLs are 404.
#[derive(Default)]
pub struct StubFetcher {
    pages: HashMap<String, String>,
}

impl StubFetcher {
    /// Serve `html` at `url`.
    #[must_use]
    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.pages.get(url).cloned().ok_or(FetchError::Status(404))
    }
}

/// Records sent emails instead of delivering them.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(Email, RenderedEmail)>>,
    fail: bool,
}

impl RecordingMailer {
    /// A mailer whose every send fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            fail: true,
        }
    }

    /// Emails sent so far.
    pub fn sent(&self) -> Vec<(Email, RenderedEmail)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &Email, email: &RenderedEmail) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::InvalidAddress("relay refused".to_string()));
        }
        self.sent.lock().unwrap().push((to.clone(), email.clone()));
        Ok(())
    }
}

// =============================================================================
// Context
// =============================================================================

/// A response with its body collected.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// Body parsed as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    /// The `error` field of a JSON error body.
    pub fn error(&self) -> String {
        self.json()["error"].as_str().unwrap_or_default().to_string()
    }

    /// A response header as text.
    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Router plus handles to its in-memory collaborators.
pub struct TestContext {
    pub router: Router,
    pub prices: Arc<MemoryPriceCache>,
    pub lists: Arc<MemoryListStore>,
    pub search: Arc<StubSearch>,
    pub mailer: Arc<RecordingMailer>,
    pub state: AppState,
    cookie: Mutex<Option<String>>,
}

/// Optional collaborators for [`TestContext::build`].
#[derive(Default)]
pub struct Options {
    pub search: StubSearch,
    pub fetcher: StubFetcher,
    pub mailer: RecordingMailer,
    pub site_filters: Vec<String>,
    pub write_queue_capacity: Option<usize>,
}

impl TestContext {
    /// Context with the given search results and defaults for the rest.
    pub fn new(search: StubSearch) -> Self {
        Self::build(Options {
            search,
            ..Options::default()
        })
    }

    /// Context from explicit options. Must run inside a Tokio runtime.
    pub fn build(options: Options) -> Self {
        let prices = Arc::new(MemoryPriceCache::new());
        let lists = Arc::new(MemoryListStore::new());
        let search = Arc::new(options.search);
        let mailer = Arc::new(options.mailer);

        let state = AppState::from_parts(StateParts {
            price_cache: prices.clone(),
            search: search.clone(),
            fetcher: Arc::new(options.fetcher),
            lists: lists.clone(),
            users: Arc::new(MemoryUserStore::new()),
            mailer: mailer.clone(),
            sites: SiteSelector::new(options.site_filters),
            limits: FanOutLimits::default(),
            write_queue_capacity: options.write_queue_capacity.unwrap_or(64),
            pool: None,
        });

        let session_layer = create_session_layer(MemoryStore::default(), false);
        let router = price_comparer_api::app(state.clone(), session_layer, None);

        Self {
            router,
            prices,
            lists,
            search,
            mailer,
            state,
            cookie: Mutex::new(None),
        }
    }

    /// `GET uri`.
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// `POST uri` with a JSON body.
    pub async fn post_json(&self, uri: &str, body: &Value) -> TestResponse {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// `POST uri` with a raw body, sent as JSON.
    pub async fn post_raw(&self, uri: &str, body: &str) -> TestResponse {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Forget the session cookie.
    pub fn clear_cookies(&self) {
        *self.cookie.lock().unwrap() = None;
    }

    /// Send a request, attaching and then updating the session cookie.
    pub async fn send(&self, mut request: Request<Body>) -> TestResponse {
        let cookie = self.cookie.lock().unwrap().clone();
        if let Some(cookie) = cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            let pair = set_cookie.split(';').next().unwrap_or_default().to_string();
            *self.cookie.lock().unwrap() = Some(pair);
        }

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}
