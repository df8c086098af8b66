//! PDF export, email and health scenarios.

#![allow(clippy::unwrap_used)]

use axum::http::{StatusCode, header};
use serde_json::json;

use price_comparer_integration_tests::{Options, RecordingMailer, StubSearch, TestContext};

fn items() -> serde_json::Value {
    json!([
        {"title": "Large eggs", "store": "walmart.com", "price": 3.12, "qty": 2},
        {"title": "Whole milk", "price": 4.5}
    ])
}

#[tokio::test]
async fn test_export_empty_list_as_pdf() {
    let ctx = TestContext::new(StubSearch::default());

    for body in [json!({"items": []}), json!({})] {
        let resp = ctx.post_json("/api/export/pdf", &body).await;

        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.header(header::CONTENT_TYPE), Some("application/pdf"));
        assert_eq!(
            resp.header(header::CONTENT_DISPOSITION),
            Some("attachment; filename=shopping_list.pdf")
        );
        assert!(resp.body.starts_with(b"%PDF"));
    }
}

#[tokio::test]
async fn test_export_items_as_pdf() {
    let ctx = TestContext::new(StubSearch::default());

    let resp = ctx.post_json("/api/export/pdf", &json!({"items": items()})).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(!resp.body.is_empty());

    let bad = ctx.post_json("/api/export/pdf", &json!({"items": 3})).await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

fn oversized_items() -> serde_json::Value {
    json!([{"title": "x", "price": "79228162514264337593543950335", "qty": 2}])
}

#[tokio::test]
async fn test_export_rejects_price_above_column_range() {
    let ctx = TestContext::new(StubSearch::default());

    let resp = ctx
        .post_json("/api/export/pdf", &json!({"items": oversized_items()}))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error(), "Invalid items list");
}

#[tokio::test]
async fn test_email_shopping_list() {
    let ctx = TestContext::new(StubSearch::default());

    let resp = ctx
        .post_json("/api/email", &json!({"email": "shopper@example.com", "items": items()}))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["message"], "Email sent successfully");

    let sent = ctx.mailer.sent();
    assert_eq!(sent.len(), 1);
    let (to, email) = &sent[0];
    assert_eq!(to.as_str(), "shopper@example.com");
    assert_eq!(email.subject, "Your Shopping List");
    assert!(email.html.contains("Large eggs"));
    assert!(email.html.contains("$10.74"));
}

#[tokio::test]
async fn test_email_rejects_bad_requests() {
    let ctx = TestContext::new(StubSearch::default());

    for body in [
        json!({"items": items()}),
        json!({"email": "not-an-email", "items": items()}),
        json!({"email": "shopper@example.com"}),
        json!({"email": "shopper@example.com", "items": []}),
        json!({"email": "shopper@example.com", "items": "eggs"}),
        json!({"email": "shopper@example.com", "items": oversized_items()}),
    ] {
        let resp = ctx.post_json("/api/email", &body).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(resp.error(), "Invalid email or shopping list");
    }
    assert!(ctx.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_email_transport_failure() {
    let ctx = TestContext::build(Options {
        mailer: RecordingMailer::failing(),
        ..Options::default()
    });

    let resp = ctx
        .post_json("/api/email", &json!({"email": "shopper@example.com", "items": items()}))
        .await;

    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.error(), "Failed to send email");
}

#[tokio::test]
async fn test_health_and_request_id() {
    let ctx = TestContext::new(StubSearch::default());

    let resp = ctx.get("/health").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(&resp.body[..], b"ok");
    assert!(resp.header(header::HeaderName::from_static("x-request-id")).is_some());

    assert_eq!(ctx.get("/health/ready").await.status, StatusCode::OK);

    let resp = ctx
        .send(
            axum::http::Request::get("/health")
                .header("x-request-id", "abc-123")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(
        resp.header(header::HeaderName::from_static("x-request-id")),
        Some("abc-123")
    );
}
