//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::db::{ListRepository, ListStore, PriceCache, PriceRepository, UserRepository, UserStore};
use crate::pricing::{FetchError, HttpPageFetcher, PageFetcher, PriceAggregator, PriceWriter};
use crate::search::{FanOutLimits, GoogleSearchClient, SearchError, SearchProvider, SiteSelector};
use crate::services::{AuthService, MailError, Mailer, SmtpMailer};

/// Error wiring the production collaborators.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("search client: {0}")]
    Search(#[from] SearchError),
    #[error("page fetcher: {0}")]
    Fetch(#[from] FetchError),
    #[error("mailer: {0}")]
    Mail(#[from] MailError),
}

/// Collaborators the state is assembled from.
///
/// Production wiring goes through [`AppState::from_config`]; tests build
/// this directly with in-memory stores and stubs.
pub struct StateParts {
    pub price_cache: Arc<dyn PriceCache>,
    pub search: Arc<dyn SearchProvider>,
    pub fetcher: Arc<dyn PageFetcher>,
    pub lists: Arc<dyn ListStore>,
    pub users: Arc<dyn UserStore>,
    pub mailer: Arc<dyn Mailer>,
    pub sites: SiteSelector,
    pub limits: FanOutLimits,
    pub write_queue_capacity: usize,
    /// Pool pinged by the readiness probe, if any.
    pub pool: Option<PgPool>,
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    aggregator: PriceAggregator,
    sites: SiteSelector,
    lists: Arc<dyn ListStore>,
    auth: AuthService,
    mailer: Arc<dyn Mailer>,
    pool: Option<PgPool>,
}

impl AppState {
    /// Assemble state from its parts.
    ///
    /// Spawns the price write worker, so this must run inside a Tokio runtime.
    #[must_use]
    pub fn from_parts(parts: StateParts) -> Self {
        let writer = PriceWriter::spawn(Arc::clone(&parts.price_cache), parts.write_queue_capacity);
        let aggregator = PriceAggregator::new(
            parts.price_cache,
            parts.search,
            parts.fetcher,
            writer,
            parts.limits,
        );

        Self {
            inner: Arc::new(AppStateInner {
                aggregator,
                sites: parts.sites,
                lists: parts.lists,
                auth: AuthService::new(parts.users),
                mailer: parts.mailer,
                pool: parts.pool,
            }),
        }
    }

    /// Wire the `PostgreSQL` repositories, Google search, HTTP page fetcher
    /// and SMTP mailer.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client or the SMTP transport can't be built.
    pub fn from_config(config: &ApiConfig, pool: PgPool) -> Result<Self, StateError> {
        let search = GoogleSearchClient::new(&config.search)?;
        let fetcher = HttpPageFetcher::new()?;
        let mailer = SmtpMailer::new(&config.email)?;

        Ok(Self::from_parts(StateParts {
            price_cache: Arc::new(PriceRepository::new(pool.clone())),
            search: Arc::new(search),
            fetcher: Arc::new(fetcher),
            lists: Arc::new(ListRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool.clone())),
            mailer: Arc::new(mailer),
            sites: SiteSelector::new(config.search.site_filters.clone()),
            limits: FanOutLimits {
                per_query: config.search.results_per_query,
                per_site: config.search.results_per_site,
            },
            write_queue_capacity: config.write_queue_capacity,
            pool: Some(pool),
        }))
    }

    /// Get a reference to the price aggregator.
    #[must_use]
    pub fn aggregator(&self) -> &PriceAggregator {
        &self.inner.aggregator
    }

    /// Get a reference to the site filter selection.
    #[must_use]
    pub fn sites(&self) -> &SiteSelector {
        &self.inner.sites
    }

    /// Get a reference to the shopping list and cart store.
    #[must_use]
    pub fn lists(&self) -> &dyn ListStore {
        self.inner.lists.as_ref()
    }

    /// Get a reference to the authentication service.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Get a reference to the mailer.
    #[must_use]
    pub fn mailer(&self) -> &dyn Mailer {
        self.inner.mailer.as_ref()
    }

    /// Get a reference to the database pool, if one is wired.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }
}
