//! Price Comparer API library.
//!
//! Grocery price search backed by Google Custom Search with a `PostgreSQL`
//! price cache, plus shopping lists, carts, accounts, PDF export and email.
//! The binary wires production collaborators; tests build the same router
//! over in-memory stores.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod pricing;
pub mod routes;
pub mod search;
pub mod services;
pub mod state;

use std::path::Path;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use state::AppState;

/// Build the application router.
///
/// `frontend_dir`, when set, is served for every path no API route claims,
/// with `index.html` as the fallback for client-side routes.
pub fn app<S>(
    state: AppState,
    session_layer: SessionManagerLayer<S>,
    frontend_dir: Option<&Path>,
) -> Router
where
    S: SessionStore + Clone,
{
    let mut router = routes::routes();

    if let Some(dir) = frontend_dir {
        let index = ServeFile::new(dir.join("index.html"));
        router = router.fallback_service(ServeDir::new(dir).fallback(index));
    }

    router
        .layer(session_layer)
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
