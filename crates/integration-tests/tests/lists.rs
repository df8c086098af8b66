//! Shopping list and cart scenarios.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use price_comparer_integration_tests::{StubSearch, TestContext};

fn items() -> serde_json::Value {
    json!([
        {"id": "g-0", "title": "Large eggs", "store": "walmart.com", "price": 3.12, "qty": 2},
        {"id": "g-1", "title": "Whole milk", "price": 4.5}
    ])
}

#[tokio::test]
async fn test_save_empty_shopping_list() {
    let ctx = TestContext::new(StubSearch::default());

    let resp = ctx.post_json("/api/shopping/save", &json!({"items": []})).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.json()["message"].as_str().unwrap().contains("saved"));
}

#[tokio::test]
async fn test_save_rejects_bad_items() {
    let ctx = TestContext::new(StubSearch::default());

    for body in [
        json!({}),
        json!({"items": "eggs"}),
        json!({"items": {"title": "eggs"}}),
        json!({"items": [{"title": "eggs", "price": 1.0, "qty": 0}]}),
        json!({"items": [{"title": "eggs", "price": -1.0}]}),
    ] {
        let resp = ctx.post_json("/api/shopping/save", &body).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{body}");
        assert!(resp.error().contains("items"), "{body}");
    }
}

#[tokio::test]
async fn test_malformed_json_is_a_bad_request() {
    let ctx = TestContext::new(StubSearch::default());

    let resp = ctx.post_raw("/api/shopping/save", "{not json").await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(!resp.error().is_empty());
}

#[tokio::test]
async fn test_shopping_list_round_trip_and_full_replace() {
    let ctx = TestContext::new(StubSearch::default());

    ctx.post_json("/api/shopping/save", &json!({"items": items(), "list_id": "weekly"}))
        .await;
    let resp = ctx.get("/api/shopping/weekly").await;
    assert_eq!(resp.status, StatusCode::OK);
    let saved = resp.json();
    assert_eq!(saved["items"].as_array().unwrap().len(), 2);
    assert_eq!(saved["items"][0]["title"], "Large eggs");
    assert_eq!(saved["items"][0]["qty"], 2);
    assert_eq!(saved["items"][1]["qty"], 1);

    ctx.post_json(
        "/api/shopping/save",
        &json!({"items": [{"title": "Bread", "price": 2.0}], "list_id": "weekly"}),
    )
    .await;
    let saved = ctx.get("/api/shopping/weekly").await.json();
    let titles: Vec<&str> = saved["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Bread"]);
}

#[tokio::test]
async fn test_shopping_list_defaults_to_default_id() {
    let ctx = TestContext::new(StubSearch::default());

    ctx.post_json("/api/shopping/save", &json!({"items": items()})).await;

    let saved = ctx.get("/api/shopping/default").await.json();
    assert_eq!(saved["items"].as_array().unwrap().len(), 2);
    let other = ctx.get("/api/shopping/unknown").await.json();
    assert_eq!(other["items"], json!([]));
}

#[tokio::test]
async fn test_cart_requires_user_id() {
    let ctx = TestContext::new(StubSearch::default());

    let resp = ctx.post_json("/api/cart/save", &json!({"items": items()})).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error(), "Missing user_id");

    let resp = ctx.post_json("/api/cart/save", &json!({"user_id": "u1"})).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.error().contains("items"));
}

#[tokio::test]
async fn test_carts_are_kept_per_user() {
    let ctx = TestContext::new(StubSearch::default());

    let resp = ctx
        .post_json("/api/cart/save", &json!({"user_id": "u1", "items": items()}))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["message"], "Cart saved!");

    assert_eq!(ctx.get("/api/cart/u1").await.json()["items"].as_array().unwrap().len(), 2);
    assert_eq!(ctx.get("/api/cart/u2").await.json()["items"], json!([]));
    // carts and shopping lists don't share keys
    assert_eq!(ctx.get("/api/shopping/u1").await.json()["items"], json!([]));
}
