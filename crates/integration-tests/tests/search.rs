//! `GET /api/search` scenarios.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use price_comparer_api::db::PriceCache;
use price_comparer_api::models::NewPriceRecord;
use price_comparer_api::pricing::WriteOutcome;
use price_comparer_core::Price;
use price_comparer_integration_tests::{Options, StubFetcher, StubSearch, TestContext, hit};

fn egg_search() -> StubSearch {
    StubSearch::default()
        .unscoped(vec![
            hit(
                "Farm eggs",
                "https://eggs.example/farm",
                "Dozen for $5.49",
                "www.eggs.example",
            ),
            hit(
                "Egg recipes",
                "https://recipes.example/eggs",
                "Ten ways to cook eggs",
                "recipes.example",
            ),
        ])
        .site(
            "walmart.com",
            vec![hit(
                "Great Value Large Eggs",
                "https://www.walmart.com/ip/1",
                "Now $3.12",
                "www.walmart.com",
            )],
        )
        .site(
            "target.com",
            vec![
                hit(
                    "Good & Gather Eggs",
                    "https://www.target.com/p/2",
                    "$4.19 each",
                    "www.target.com",
                ),
                // same link as the unscoped result
                hit("Farm eggs", "https://eggs.example/farm", "$9.99", "www.target.com"),
            ],
        )
}

#[tokio::test]
async fn test_missing_query_is_rejected() {
    let ctx = TestContext::new(StubSearch::default());

    for uri in ["/api/search", "/api/search?query=", "/api/search?query=%20%20&zipcode=01002"] {
        let resp = ctx.get(uri).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(resp.error().contains("query"), "{uri}");
    }
    assert!(ctx.search.calls().is_empty());
}

#[tokio::test]
async fn test_us_zipcode_searches_us_grocers_and_ranks_results() {
    let ctx = TestContext::new(egg_search());

    let resp = ctx.get("/api/search?query=eggs&zipcode=01002").await;
    assert_eq!(resp.status, StatusCode::OK);

    let calls = ctx.search.calls();
    let sites: Vec<Option<&str>> = calls.iter().map(|c| c.site.as_deref()).collect();
    assert_eq!(
        sites,
        vec![
            None,
            Some("walmart.com"),
            Some("target.com"),
            Some("costco.com"),
            Some("instacart.com"),
            Some("aldi.us"),
        ]
    );
    assert_eq!(calls[0].num, 5);
    assert!(calls[1..].iter().all(|c| c.num == 3));

    let results = resp.json();
    let results = results.as_array().unwrap();
    for item in results {
        for field in ["id", "store", "title", "price", "lastUpdated", "link"] {
            assert!(item.get(field).is_some(), "missing {field}: {item}");
        }
        assert_eq!(item["cached"], false);
        assert_eq!(item["size"], "");
        assert_eq!(item["unitPrice"], "");
    }

    // duplicate link dropped, priced ascending, unpriced last
    let titles: Vec<&str> = results.iter().map(|r| r["title"].as_str().unwrap()).collect();
    assert_eq!(
        titles,
        vec!["Great Value Large Eggs", "Good & Gather Eggs", "Farm eggs", "Egg recipes"]
    );
    assert_eq!(results[0]["price"].as_f64(), Some(3.12));
    assert_eq!(results[0]["store"], "walmart.com");
    assert_eq!(results[2]["store"], "eggs.example");
    assert!(results[3]["price"].is_null());
}

#[tokio::test]
async fn test_indian_pin_and_unknown_zipcodes() {
    let ctx = TestContext::new(StubSearch::default());
    ctx.get("/api/search?query=atta&zipcode=560001").await;
    let sites: Vec<String> = ctx.search.calls().into_iter().filter_map(|c| c.site).collect();
    assert_eq!(sites, vec!["bigbasket.com", "flipkart.com"]);

    let ctx = TestContext::new(StubSearch::default());
    let resp = ctx.get("/api/search?query=atta&zipcode=not-a-zip").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(ctx.search.calls().len(), 9);
}

#[tokio::test]
async fn test_configured_site_filters_override_zipcode() {
    let ctx = TestContext::build(Options {
        site_filters: vec!["aldi.us".to_string()],
        ..Options::default()
    });

    ctx.get("/api/search?query=milk&zipcode=560001").await;

    let sites: Vec<String> = ctx.search.calls().into_iter().filter_map(|c| c.site).collect();
    assert_eq!(sites, vec!["aldi.us"]);
}

#[tokio::test]
async fn test_failing_site_does_not_abort_fan_out() {
    let ctx = TestContext::new(egg_search().failing("walmart.com"));

    let resp = ctx.get("/api/search?query=eggs&zipcode=01002").await;
    assert_eq!(resp.status, StatusCode::OK);

    let results = resp.json();
    let links: Vec<&str> = results
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["link"].as_str().unwrap())
        .collect();
    assert!(!links.contains(&"https://www.walmart.com/ip/1"));
    assert!(links.contains(&"https://www.target.com/p/2"));
}

#[tokio::test]
async fn test_page_json_ld_fills_missing_snippet_price() {
    let ctx = TestContext::build(Options {
        search: StubSearch::default().unscoped(vec![hit(
            "Organic milk",
            "https://shop.example/milk",
            "Fresh organic whole milk",
            "shop.example",
        )]),
        fetcher: StubFetcher::default().page(
            "https://shop.example/milk",
            concat!(
                r#"<script type="application/ld+json">"#,
                r#"{"@type":"Product","offers":{"price":"6.79"}}"#,
                "</script>",
            ),
        ),
        ..Options::default()
    });

    let resp = ctx.get("/api/search?query=milk&zipcode=01002").await;

    let results = resp.json();
    assert_eq!(results[0]["price"].as_f64(), Some(6.79));
}

#[tokio::test]
async fn test_live_prices_are_cached_for_the_next_query() {
    let ctx = TestContext::new(egg_search());
    let mut outcomes = ctx.state.aggregator().writer().subscribe();

    ctx.get("/api/search?query=eggs&zipcode=01002").await;

    // three priced results after de-duplication
    for _ in 0..3 {
        assert!(matches!(
            outcomes.recv().await.unwrap(),
            WriteOutcome::Written { .. }
        ));
    }
    assert_eq!(ctx.prices.rows().await.len(), 3);
    let calls_after_first = ctx.search.calls().len();

    let resp = ctx.get("/api/search?query=EGGS&zipcode=01002").await;
    let results = resp.json();
    let results = results.as_array().unwrap();

    assert_eq!(ctx.search.calls().len(), calls_after_first);
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r["cached"] == true));
    assert!(results.iter().all(|r| r["id"].as_str().unwrap().starts_with("c-")));
    let prices: Vec<f64> = results.iter().map(|r| r["price"].as_f64().unwrap()).collect();
    assert_eq!(prices, vec![3.12, 4.19, 5.49]);
}

#[tokio::test]
async fn test_cache_hit_is_the_whole_answer() {
    let ctx = TestContext::new(egg_search());
    for (title, price) in [("Brown eggs 6ct", "2.75"), ("Cage free eggs", "1.99")] {
        ctx.prices
            .append(&NewPriceRecord {
                title: title.to_string(),
                price: Price::parse_text(price).unwrap(),
                source: "costco.com".to_string(),
                external_link: format!("https://costco.com/{price}"),
            })
            .await
            .unwrap();
    }

    let resp = ctx.get("/api/search?query=eggs").await;
    let results = resp.json();
    let titles: Vec<&str> = results
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect();

    assert_eq!(titles, vec!["Cage free eggs", "Brown eggs 6ct"]);
    assert!(ctx.search.calls().is_empty());
}
