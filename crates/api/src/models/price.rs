//! Price search domain types.
//!
//! A query moves through three shapes: [`PriceCandidate`] (a raw search hit),
//! [`PriceQuote`] (a candidate after extraction, or a cache row), and
//! [`SearchResultItem`] (the JSON the frontend renders).

use chrono::{DateTime, Utc};
use serde::Serialize;

use price_comparer_core::{Price, PriceRecordId};

/// A row of the price cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPrice {
    /// Row id.
    pub id: PriceRecordId,
    /// Product title as seen in the search result.
    pub title: String,
    /// Resolved price.
    pub price: Price,
    /// Store domain the price came from.
    pub source: String,
    /// Product page URL.
    pub external_link: String,
    /// When the row was appended.
    pub inserted_at: DateTime<Utc>,
}

/// A price observation waiting to be appended to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPriceRecord {
    /// Product title.
    pub title: String,
    /// Resolved price.
    pub price: Price,
    /// Store domain.
    pub source: String,
    /// Product page URL.
    pub external_link: String,
}

/// A search hit that may or may not carry a price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceCandidate {
    /// Result title.
    pub title: String,
    /// Result URL.
    pub link: String,
    /// Result snippet, scanned for a price first.
    pub snippet: Option<String>,
    /// Site filter for scoped searches, display domain otherwise.
    pub source: String,
}

impl PriceCandidate {
    /// Attach the outcome of price extraction.
    #[must_use]
    pub fn quote(self, price: Option<Price>, observed_at: DateTime<Utc>) -> PriceQuote {
        PriceQuote {
            record_id: None,
            title: self.title,
            link: self.link,
            source: self.source,
            price,
            cached: false,
            observed_at,
        }
    }
}

/// One entry of an aggregated, ranked result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuote {
    /// Cache row id for cached entries.
    pub record_id: Option<PriceRecordId>,
    /// Product title.
    pub title: String,
    /// Product page URL.
    pub link: String,
    /// Store domain.
    pub source: String,
    /// Resolved price, if any.
    pub price: Option<Price>,
    /// Whether this entry came from the cache.
    pub cached: bool,
    /// Cache insertion time, or the time of the live search.
    pub observed_at: DateTime<Utc>,
}

impl PriceQuote {
    /// The cache record to append for a freshly priced quote.
    ///
    /// Returns `None` for cached entries and for quotes without a price.
    #[must_use]
    pub fn to_record(&self) -> Option<NewPriceRecord> {
        if self.cached {
            return None;
        }
        self.price.map(|price| NewPriceRecord {
            title: self.title.clone(),
            price,
            source: self.source.clone(),
            external_link: self.link.clone(),
        })
    }
}

impl From<CachedPrice> for PriceQuote {
    fn from(row: CachedPrice) -> Self {
        Self {
            record_id: Some(row.id),
            title: row.title,
            link: row.external_link,
            source: row.source,
            price: Some(row.price),
            cached: true,
            observed_at: row.inserted_at,
        }
    }
}

/// Search result as returned by `GET /api/search`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    /// `c-<row id>` for cached entries, `g-<rank>` for live ones.
    pub id: String,
    /// Store domain without a leading `www.`.
    pub store: String,
    /// Product title.
    pub title: String,
    /// Package size; not extracted, always empty.
    pub size: String,
    /// Unit price text; not extracted, always empty.
    pub unit_price: String,
    /// Price, or `null` when none was found.
    pub price: Option<Price>,
    /// When the price was observed.
    pub last_updated: DateTime<Utc>,
    /// Product page URL.
    pub link: String,
    /// Whether this entry came from the cache.
    pub cached: bool,
}

impl SearchResultItem {
    /// Build the wire shape for the quote at `rank` in the result.
    #[must_use]
    pub fn from_quote(rank: usize, quote: PriceQuote) -> Self {
        let id = quote
            .record_id
            .map_or_else(|| format!("g-{rank}"), |id| format!("c-{id}"));
        let store = quote
            .source
            .strip_prefix("www.")
            .unwrap_or(&quote.source)
            .to_owned();

        Self {
            id,
            store,
            title: quote.title,
            size: String::new(),
            unit_price: String::new(),
            price: quote.price,
            last_updated: quote.observed_at,
            link: quote.link,
            cached: quote.cached,
        }
    }
}
