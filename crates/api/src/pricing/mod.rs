//! Price aggregation.
//!
//! One pass per query, no retries:
//!
//! 1. Cache lookup. Any hit is the whole answer.
//! 2. Search fan-out across the engine and each site filter.
//! 3. De-duplicate by link, first occurrence wins.
//! 4. Extract prices with bounded concurrency.
//! 5. Queue newly priced results for the cache.
//! 6. Rank: priced results cheapest first, then unpriced in encounter order.

pub mod extract;
pub mod fetch;
pub mod writer;

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};

use crate::db::PriceCache;
use crate::models::{PriceCandidate, PriceQuote};
use crate::search::{FanOutLimits, SearchProvider, fan_out};

pub use extract::PriceExtractor;
pub use fetch::{FetchError, HttpPageFetcher, PageFetcher};
pub use writer::{PriceWriter, WriteOutcome, WriteStats};

/// Candidates whose prices are extracted at the same time.
pub const EXTRACTION_CONCURRENCY: usize = 8;

/// Answers price queries from the cache or a live search.
pub struct PriceAggregator {
    cache: Arc<dyn PriceCache>,
    search: Arc<dyn SearchProvider>,
    extractor: PriceExtractor,
    writer: PriceWriter,
    limits: FanOutLimits,
}

impl PriceAggregator {
    /// Create an aggregator.
    #[must_use]
    pub fn new(
        cache: Arc<dyn PriceCache>,
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn PageFetcher>,
        writer: PriceWriter,
        limits: FanOutLimits,
    ) -> Self {
        Self {
            cache,
            search,
            extractor: PriceExtractor::new(fetcher),
            writer,
            limits,
        }
    }

    /// The write queue used for new prices.
    #[must_use]
    pub const fn writer(&self) -> &PriceWriter {
        &self.writer
    }

    /// Ranked quotes for `query`, searching `sites` on a cache miss.
    ///
    /// Never fails: cache, search and extraction problems are logged and
    /// degrade the result instead.
    #[tracing::instrument(skip(self, sites), fields(sites = sites.len()))]
    pub async fn search(&self, query: &str, sites: &[String]) -> Vec<PriceQuote> {
        match self.cache.lookup(query).await {
            Ok(rows) if !rows.is_empty() => {
                tracing::info!(hits = rows.len(), "Price cache hit");
                return rank(rows.into_iter().map(PriceQuote::from).collect());
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Price cache lookup failed, searching live"),
        }

        let candidates = dedupe_by_link(
            fan_out(self.search.as_ref(), query, sites, self.limits).await,
        );

        let observed_at = Utc::now();
        let extractor = &self.extractor;
        let quotes: Vec<PriceQuote> = stream::iter(candidates)
            .map(|candidate| async move {
                let price = extractor.extract(&candidate).await;
                candidate.quote(price, observed_at)
            })
            .buffered(EXTRACTION_CONCURRENCY)
            .collect()
            .await;

        for record in quotes.iter().filter_map(PriceQuote::to_record) {
            self.writer.enqueue(record);
        }

        let ranked = rank(quotes);
        tracing::info!(
            results = ranked.len(),
            priced = ranked.iter().filter(|q| q.price.is_some()).count(),
            "Live price search complete"
        );
        ranked
    }
}

/// Keep the first candidate for each link; drop candidates without one.
#[must_use]
pub fn dedupe_by_link(candidates: Vec<PriceCandidate>) -> Vec<PriceCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| !c.link.is_empty() && seen.insert(c.link.clone()))
        .collect()
}

/// Stable sort: priced quotes ascending, unpriced after them.
#[must_use]
pub fn rank(mut quotes: Vec<PriceQuote>) -> Vec<PriceQuote> {
    quotes.sort_by(|a, b| match (a.price, b.price) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    quotes
}
