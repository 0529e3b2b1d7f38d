//! REST contract tests over the in-process router.

use anyhow::Result;
use assert_json_diff::assert_json_include;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use lpse_scraper::renderer::{BrowserEngine, PageSession};
use lpse_scraper::rest::{router, AppState};
use lpse_scraper::scraper::{current_year, TenderScraper};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const TOKEN_PAGE: &str = "<script>authenticityToken = 'cafebabe0042';</script>";

/// Engine stub that serves a fixed page and data payload, recording every
/// in-page script it is asked to run.
struct StubEngine {
    page_html: String,
    response_body: String,
    scripts: Arc<Mutex<Vec<String>>>,
}

struct StubSession {
    page_html: String,
    response_body: String,
    scripts: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl BrowserEngine for StubEngine {
    async fn launch(&self) -> Result<Box<dyn PageSession>> {
        Ok(Box::new(StubSession {
            page_html: self.page_html.clone(),
            response_body: self.response_body.clone(),
            scripts: Arc::clone(&self.scripts),
        }))
    }
}

#[async_trait]
impl PageSession for StubSession {
    async fn goto(&self, _url: &str) -> Result<()> {
        Ok(())
    }

    async fn body_html(&self) -> Result<String> {
        Ok(self.page_html.clone())
    }

    async fn eval_json(&self, script: &str) -> Result<Value> {
        self.scripts.lock().unwrap().push(script.to_string());
        Ok(Value::String(
            json!({ "ok": true, "status": 200, "body": self.response_body }).to_string(),
        ))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

fn app(page_html: &str, response_body: &str) -> (Router, Arc<Mutex<Vec<String>>>) {
    let scripts = Arc::new(Mutex::new(Vec::new()));
    let engine = StubEngine {
        page_html: page_html.to_string(),
        response_body: response_body.to_string(),
        scripts: Arc::clone(&scripts),
    };
    let scraper = TenderScraper::new(Arc::new(engine), "https://spse.example.test/kemhan");
    let state = Arc::new(AppState {
        scraper,
        chromium_available: false,
    });
    (router(state), scripts)
}

fn tender_body() -> String {
    json!({
        "recordsTotal": 310,
        "recordsFiltered": 25,
        "data": [["90210", "Pembangunan Gedung", "12.5 M"]],
    })
    .to_string()
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, value)
}

#[tokio::test]
async fn scrape_success_wraps_counts_and_rows() {
    let (app, _) = app(TOKEN_PAGE, &tender_body());
    let (status, body) = get(app, "/api/v1/scrape?year=2024").await;

    assert_eq!(status, StatusCode::OK);
    assert_json_include!(
        actual: body.clone(),
        expected: json!({
            "success": true,
            "metadata": { "recordsTotal": 310, "recordsFiltered": 25 },
        })
    );
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert!(body["message"].as_str().unwrap().contains("2024"));
}

#[tokio::test]
async fn scrape_failure_maps_to_500_with_error_kind() {
    let (app, _) = app("<html>challenge never resolved</html>", &tender_body());
    let (status, body) = get(app, "/api/v1/scrape?year=2024").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_json_include!(
        actual: body.clone(),
        expected: json!({ "success": false, "error_kind": "token_extraction" })
    );
    assert!(body["error"].as_str().unwrap().contains("authenticityToken"));
}

#[tokio::test]
async fn omitted_year_defaults_to_current_calendar_year() {
    let (app, scripts) = app(TOKEN_PAGE, &tender_body());
    let (status, _) = get(app, "/api/v1/scrape").await;

    assert_eq!(status, StatusCode::OK);
    let scripts = scripts.lock().unwrap();
    assert_eq!(scripts.len(), 1);
    assert!(scripts[0].contains(&format!("tahun={}", current_year())));
}

#[tokio::test]
async fn non_numeric_year_is_rejected() {
    let (app, scripts) = app(TOKEN_PAGE, &tender_body());
    let (status, _) = get(app, "/api/v1/scrape?year=banana").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(scripts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn health_reports_chromium_availability() {
    let (app, _) = app(TOKEN_PAGE, &tender_body());
    let (status, body) = get(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["chromium_available"], false);
}

#[tokio::test]
async fn root_page_documents_the_endpoint() {
    let (app, _) = app(TOKEN_PAGE, &tender_body());
    let (status, body) = get(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.as_str().unwrap().contains("/api/v1/scrape"));
}
