// Copyright 2026 LPSE Scraper Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP surface for the scraper.
//!
//! One data endpoint (`GET /api/v1/scrape?year=`), a health probe, and a
//! static informational root page. The handler does the outcome mapping:
//! orchestrator success becomes a 200 with count metadata and the record
//! rows, any [`ScrapeError`] becomes a 500 carrying the human-readable
//! message plus a stable `error_kind` field.

use crate::scraper::{current_year, TenderScraper};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::error::ScrapeError;

/// Shared state for the HTTP handlers.
pub struct AppState {
    pub scraper: TenderScraper,
    /// Whether a Chromium executable was resolved at startup. Requests are
    /// still accepted without one; they fail per call with `browser_launch`.
    pub chromium_available: bool,
}

/// Build the axum router with all endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/v1/scrape", get(handle_scrape))
        .layer(cors)
        .with_state(state)
}

/// Bind a TCP listener and serve the API until the process exits.
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("HTTP API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// ── Handlers ────────────────────────────────────────────────────

async fn index() -> Html<&'static str> {
    Html(
        "<h2>LPSE Tender Scraper</h2>\
         <p>Use <strong>GET /api/v1/scrape?year=2024</strong> to fetch tender listings. \
         The <code>year</code> parameter defaults to the current calendar year.</p>",
    )
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "chromium_available": state.chromium_available,
    }))
}

#[derive(Deserialize, Default)]
struct ScrapeParams {
    year: Option<i32>,
}

async fn handle_scrape(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScrapeParams>,
) -> (StatusCode, Json<Value>) {
    let year = params.year.unwrap_or_else(current_year);

    // Run the scrape on its own task: a dropped client connection must not
    // cancel it mid-flight, or the browser teardown step would never run.
    let outcome = {
        let state = Arc::clone(&state);
        tokio::spawn(async move { state.scraper.scrape(year).await }).await
    };

    match outcome {
        Err(join_err) => {
            error!(year, "scrape task failed: {join_err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": format!("failed to scrape tender data for {year}"),
                    "error": format!("scrape task failed: {join_err}"),
                    "error_kind": "internal",
                })),
            )
        }
        Ok(Ok(set)) => {
            info!(year, rows = set.data.len(), "scrape request served");
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "message": format!("tender data for {year} retrieved"),
                    "metadata": {
                        "recordsTotal": set.records_total,
                        "recordsFiltered": set.records_filtered,
                    },
                    "data": set.data,
                })),
            )
        }
        Ok(Err(e)) => {
            error!(year, kind = e.kind(), "scrape request failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(failure_body(year, &e)))
        }
    }
}

fn failure_body(year: i32, e: &ScrapeError) -> Value {
    json!({
        "success": false,
        "message": format!("failed to scrape tender data for {year}"),
        "error": e.to_string(),
        "error_kind": e.kind(),
    })
}
