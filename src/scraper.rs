//! The scrape orchestrator.
//!
//! Owns the full lifecycle of a single scrape operation: launch a browser,
//! navigate to the listing page (the browser's own script execution passes
//! the verification challenge during the load), extract the session-bound
//! `authenticityToken` from the rendered markup, issue the DataTables POST
//! from inside the page context, parse the response, and tear the browser
//! down on every exit path.
//!
//! Steps run in strict sequence; the first failure aborts the rest and
//! proceeds directly to teardown. Nothing is retried and no state survives
//! the call.

use crate::error::ScrapeError;
use crate::renderer::{BrowserEngine, PageSession};
use anyhow::anyhow;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

/// Fixed DataTables page size. A single page is requested per scrape;
/// pagination beyond it is out of scope.
const PAGE_LENGTH: u32 = 25;

/// Parsed tender listing response: count metadata plus the rows themselves.
/// Rows are opaque pass-through values — their shape belongs to the
/// upstream service and is forwarded unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenderResultSet {
    #[serde(rename = "recordsTotal")]
    pub records_total: i64,
    #[serde(rename = "recordsFiltered")]
    pub records_filtered: i64,
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

/// The current calendar year, used when a request omits the year parameter.
pub fn current_year() -> i32 {
    use chrono::Datelike;
    chrono::Utc::now().year()
}

/// Extract the session authenticity token from rendered page markup.
///
/// The upstream page assigns it inline as `authenticityToken = '<hex>';`.
/// A miss means either markup drift or a challenge that was never actually
/// passed — the data endpoint silently rejects tokenless requests instead
/// of returning an auth error, so this is the correctness-sensitive step.
pub fn extract_token(html: &str) -> Option<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        Regex::new(r"authenticityToken = '([a-f0-9]+)';").expect("token pattern is valid")
    });
    re.captures(html).map(|caps| caps[1].to_string())
}

/// Build the in-page fetch script for the data endpoint.
///
/// The POST has to come from the page's own network stack so that session
/// cookies, origin headers, and TLS fingerprint match what the site expects
/// from a legitimate in-page request. The script returns a JSON-string
/// envelope (`ok`/`status`/`body` or `ok: false`/`error`) so transport
/// failures and HTTP rejections stay distinguishable on the Rust side.
fn fetch_script(data_url: &str, token: &str) -> String {
    // Token is lowercase hex by construction; the URL still goes through a
    // JSON string literal so it cannot break out of the script.
    let url = serde_json::Value::String(data_url.to_string()).to_string();
    format!(
        r#"
(async () => {{
    const body = new URLSearchParams();
    body.append('draw', '1');
    body.append('start', '0');
    body.append('length', '{PAGE_LENGTH}');
    body.append('search[value]', '');
    body.append('authenticityToken', '{token}');
    try {{
        const response = await fetch({url}, {{
            method: 'POST',
            headers: {{
                'Content-Type': 'application/x-www-form-urlencoded; charset=UTF-8',
                'X-Requested-With': 'XMLHttpRequest'
            }},
            body: body.toString()
        }});
        const text = await response.text();
        return JSON.stringify({{ ok: true, status: response.status, body: text }});
    }} catch (e) {{
        return JSON.stringify({{ ok: false, error: String(e) }});
    }}
}})()
"#
    )
}

/// Envelope produced by the in-page fetch script.
#[derive(Deserialize)]
struct FetchEnvelope {
    ok: bool,
    #[serde(default)]
    status: u16,
    #[serde(default)]
    body: String,
    #[serde(default)]
    error: Option<String>,
}

fn parse_envelope(value: serde_json::Value) -> Result<TenderResultSet, ScrapeError> {
    let raw = value.as_str().ok_or_else(|| {
        ScrapeError::DataRequest(anyhow!("in-page fetch returned a non-string result"))
    })?;
    let envelope: FetchEnvelope = serde_json::from_str(raw)
        .map_err(|e| ScrapeError::DataRequest(anyhow!("malformed fetch envelope: {e}")))?;

    if !envelope.ok {
        let reason = envelope.error.unwrap_or_else(|| "unknown error".to_string());
        return Err(ScrapeError::DataRequest(anyhow!(
            "in-page fetch failed: {reason}"
        )));
    }
    if !(200..300).contains(&envelope.status) {
        return Err(ScrapeError::DataRequest(anyhow!(
            "data endpoint returned HTTP {}",
            envelope.status
        )));
    }

    serde_json::from_str(&envelope.body).map_err(|e| {
        ScrapeError::DataRequest(anyhow!("data endpoint returned an unexpected body: {e}"))
    })
}

/// Orchestrates one scrape operation per call.
///
/// Holds no state between invocations. Concurrent callers each get their
/// own browser session from the engine; nothing is shared between them.
pub struct TenderScraper {
    engine: Arc<dyn BrowserEngine>,
    base_url: String,
}

impl TenderScraper {
    pub fn new(engine: Arc<dyn BrowserEngine>, base_url: impl Into<String>) -> Self {
        Self {
            engine,
            base_url: base_url.into(),
        }
    }

    /// Run one full scrape for the given budget year.
    pub async fn scrape(&self, year: i32) -> Result<TenderResultSet, ScrapeError> {
        info!(year, "starting scrape");
        let session = self
            .engine
            .launch()
            .await
            .map_err(ScrapeError::BrowserLaunch)?;

        let outcome = self.run_steps(session.as_ref(), year).await;

        // Teardown runs on every path. A close failure is logged but never
        // masks the scrape outcome.
        if let Err(e) = session.close().await {
            warn!("browser session close failed: {e:#}");
        }

        match &outcome {
            Ok(set) => info!(
                year,
                records_total = set.records_total,
                records_filtered = set.records_filtered,
                rows = set.data.len(),
                "scrape finished"
            ),
            Err(e) => warn!(year, kind = e.kind(), "scrape failed: {e}"),
        }
        outcome
    }

    async fn run_steps(
        &self,
        page: &dyn PageSession,
        year: i32,
    ) -> Result<TenderResultSet, ScrapeError> {
        let listing_url = format!("{}/lelang", self.base_url);
        page.goto(&listing_url)
            .await
            .map_err(ScrapeError::NavigationTimeout)?;
        info!("listing page settled");

        // A failed markup read means the page or process died mid-flight,
        // so it is a navigation failure; TokenExtraction is reserved for
        // "page rendered, pattern absent".
        let html = page
            .body_html()
            .await
            .map_err(ScrapeError::NavigationTimeout)?;
        let token = extract_token(&html).ok_or(ScrapeError::TokenExtraction)?;
        info!(token_len = token.len(), "authenticity token extracted");

        let data_url = format!("{}/dt/lelang?tahun={year}", self.base_url);
        let script = fetch_script(&data_url, &token);
        let envelope = page
            .eval_json(&script)
            .await
            .map_err(ScrapeError::DataRequest)?;
        parse_envelope(envelope)
    }
}
