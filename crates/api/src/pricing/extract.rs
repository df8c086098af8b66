//! Price extraction from search snippets and product pages.
//!
//! Snippets are scanned first since they cost nothing. When a snippet has no
//! price, the product page is fetched and its schema.org JSON-LD blocks are
//! searched for an offer price. Page outcomes, including "no price", are
//! memoized per link for five minutes.

use std::str::FromStr;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use moka::future::Cache;
use regex::Regex;
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use serde_json::Value;

use price_comparer_core::Price;

use super::fetch::{PageFetcher, is_fetchable};
use crate::models::PriceCandidate;

/// `$`, optional space, digits (optionally comma-grouped), up to two decimals.
static SNIPPET_PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\s?((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{1,2})?)").expect("Invalid regex")
});

const PAGE_MEMO_TTL: Duration = Duration::from_secs(300);
const PAGE_MEMO_CAPACITY: u64 = 10_000;

/// First currency-prefixed price in a snippet.
///
/// A zero amount counts as no price; listings use it as a placeholder.
#[must_use]
pub fn snippet_price(snippet: &str) -> Option<Price> {
    let amount = SNIPPET_PRICE_RE.captures(snippet)?.get(1)?.as_str();
    Price::parse_text(amount)
        .ok()
        .filter(|price| !price.amount().is_zero())
}

/// First `offers.price` found in the page's JSON-LD blocks.
///
/// Each block may be a single object, an array of objects, or an object with
/// an `@graph` array. `offers` may be an object or an array, and the price a
/// number or a numeric string. Blocks that aren't valid JSON are skipped.
#[must_use]
pub fn json_ld_price(html: &str) -> Option<Price> {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;
    let document = Html::parse_document(html);

    document.select(&selector).find_map(|script| {
        let text: String = script.text().collect();
        serde_json::from_str::<Value>(text.trim())
            .ok()
            .and_then(|json| node_price(&json))
    })
}

fn node_price(node: &Value) -> Option<Price> {
    match node {
        Value::Array(nodes) => nodes.iter().find_map(node_price),
        Value::Object(map) => map
            .get("offers")
            .and_then(offers_price)
            .or_else(|| map.get("@graph").and_then(node_price)),
        _ => None,
    }
}

fn offers_price(offers: &Value) -> Option<Price> {
    match offers {
        Value::Array(list) => list.iter().find_map(offers_price),
        Value::Object(map) => map
            .get("price")
            .and_then(price_value)
            .or_else(|| map.get("lowPrice").and_then(price_value)),
        _ => None,
    }
}

fn price_value(value: &Value) -> Option<Price> {
    let price = match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .and_then(|d| Price::new(d).ok()),
        Value::String(s) => Price::parse_text(s).ok(),
        _ => None,
    }?;
    (!price.amount().is_zero()).then_some(price)
}

/// Resolves a candidate's price from its snippet or page.
pub struct PriceExtractor {
    fetcher: Arc<dyn PageFetcher>,
    page_memo: Cache<String, Option<Price>>,
}

impl PriceExtractor {
    /// Create an extractor that fetches pages through `fetcher`.
    #[must_use]
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        let page_memo = Cache::builder()
            .max_capacity(PAGE_MEMO_CAPACITY)
            .time_to_live(PAGE_MEMO_TTL)
            .build();

        Self { fetcher, page_memo }
    }

    /// Price for a candidate, or `None` when neither source yields one.
    pub async fn extract(&self, candidate: &PriceCandidate) -> Option<Price> {
        if let Some(price) = candidate.snippet.as_deref().and_then(snippet_price) {
            return Some(price);
        }
        self.page_price(&candidate.link).await
    }

    async fn page_price(&self, link: &str) -> Option<Price> {
        if !is_fetchable(link) {
            return None;
        }

        if let Some(memoized) = self.page_memo.get(link).await {
            tracing::debug!(link, "Page price memo hit");
            return memoized;
        }

        let price = match self.fetcher.fetch(link).await {
            Ok(html) => json_ld_price(&html),
            Err(e) => {
                tracing::debug!(link, error = %e, "Page fetch failed");
                None
            }
        };

        self.page_memo.insert(link.to_owned(), price).await;
        price
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::pricing::fetch::FetchError;

    fn price(text: &str) -> Price {
        Price::parse_text(text).unwrap()
    }

    fn page(json_ld: &str) -> String {
        format!(
            r#"<html><head>
                <script type="application/ld+json">{json_ld}</script>
            </head><body><h1>Product</h1></body></html>"#
        )
    }

    struct CountingFetcher {
        body: Result<String, u16>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PageFetcher for CountingFetcher {
        async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.body.clone().map_err(FetchError::Status)
        }
    }

    fn candidate(snippet: Option<&str>, link: &str) -> PriceCandidate {
        PriceCandidate {
            title: "Eggs".to_string(),
            link: link.to_string(),
            snippet: snippet.map(String::from),
            source: "walmart.com".to_string(),
        }
    }

    #[test]
    fn test_snippet_price_formats() {
        assert_eq!(snippet_price("Now $7.19 each"), Some(price("7.19")));
        assert_eq!(snippet_price("only $ 4.50!"), Some(price("4.50")));
        assert_eq!(snippet_price("$12 a dozen"), Some(price("12")));
        assert_eq!(snippet_price("was $1,299.99 now"), Some(price("1299.99")));
        assert_eq!(snippet_price("$3.5 per lb"), Some(price("3.5")));
    }

    #[test]
    fn test_snippet_price_takes_first_match() {
        assert_eq!(snippet_price("$2.99 or 2 for $5.00"), Some(price("2.99")));
    }

    #[test]
    fn test_snippet_without_price() {
        assert_eq!(snippet_price("Fresh eggs from local farms"), None);
        assert_eq!(snippet_price("Costs 4.99 USD"), None);
        assert_eq!(snippet_price("$0.00 shipping"), None);
        assert_eq!(snippet_price(""), None);
    }

    #[test]
    fn test_json_ld_single_object() {
        let html = page(r#"{"@type":"Product","offers":{"@type":"Offer","price":"3.49"}}"#);
        assert_eq!(json_ld_price(&html), Some(price("3.49")));
    }

    #[test]
    fn test_json_ld_numeric_price_and_array() {
        let html =
            page(r#"[{"@type":"Organization"},{"@type":"Product","offers":{"price":5.25}}]"#);
        assert_eq!(json_ld_price(&html), Some(price("5.25")));
    }

    #[test]
    fn test_json_ld_graph_and_offer_list() {
        let html = page(
            r#"{"@context":"https://schema.org","@graph":[
                {"@type":"WebPage"},
                {"@type":"Product","offers":[{"price":"8.00"},{"price":"9.00"}]}
            ]}"#,
        );
        assert_eq!(json_ld_price(&html), Some(price("8.00")));
    }

    #[test]
    fn test_json_ld_skips_bad_blocks() {
        let html = r#"<html><head>
            <script type="application/ld+json">{ not json </script>
            <script type="application/ld+json">{"offers":{"price":"2.10"}}</script>
        </head></html>"#;
        assert_eq!(json_ld_price(html), Some(price("2.10")));
        assert_eq!(json_ld_price("<html><body>no data</body></html>"), None);
    }

    #[tokio::test]
    async fn test_extract_prefers_snippet() {
        let fetcher = Arc::new(CountingFetcher {
            body: Ok(page(r#"{"offers":{"price":"9.99"}}"#)),
            calls: AtomicUsize::new(0),
        });
        let extractor = PriceExtractor::new(fetcher.clone());

        let found = extractor
            .extract(&candidate(Some("Sale $1.99"), "https://a.com/1"))
            .await;
        assert_eq!(found, Some(price("1.99")));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_extract_falls_back_to_page_and_memoizes() {
        let fetcher = Arc::new(CountingFetcher {
            body: Ok(page(r#"{"offers":{"price":"9.99"}}"#)),
            calls: AtomicUsize::new(0),
        });
        let extractor = PriceExtractor::new(fetcher.clone());
        let c = candidate(Some("no price here"), "https://a.com/1");

        assert_eq!(extractor.extract(&c).await, Some(price("9.99")));
        assert_eq!(extractor.extract(&c).await, Some(price("9.99")));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_extract_swallows_fetch_errors() {
        let fetcher = Arc::new(CountingFetcher {
            body: Err(503),
            calls: AtomicUsize::new(0),
        });
        let extractor = PriceExtractor::new(fetcher.clone());

        assert_eq!(extractor.extract(&candidate(None, "https://a.com/x")).await, None);
        // "no price" is memoized too
        assert_eq!(extractor.extract(&candidate(None, "https://a.com/x")).await, None);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_extract_never_fetches_non_http_links() {
        let fetcher = Arc::new(CountingFetcher {
            body: Ok(page(r#"{"offers":{"price":"1.00"}}"#)),
            calls: AtomicUsize::new(0),
        });
        let extractor = PriceExtractor::new(fetcher.clone());

        assert_eq!(extractor.extract(&candidate(None, "file:///tmp/x")).await, None);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }
}
