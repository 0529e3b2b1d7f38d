//! Browser-engine abstraction for challenge-gated scraping.
//!
//! Defines the `BrowserEngine` and `PageSession` traits that isolate the
//! browser (currently Chromium via chromiumoxide) behind a seam the
//! orchestrator can be tested against. The engine's own script execution
//! is what satisfies the upstream verification challenge; nothing here
//! implements challenge-solving logic.
//!
//! One `launch()` call spawns one browser process with one page in it.
//! Sessions are never pooled or shared between scrape operations —
//! isolation over pooling is a deliberate choice, traded against
//! per-request startup cost.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;

/// A browser engine that can spawn isolated page sessions.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    /// Spawn a fresh browser process and open a single page in it.
    async fn launch(&self) -> Result<Box<dyn PageSession>>;
}

/// An exclusively-owned browser process plus one page within it.
///
/// Must be closed exactly once via [`PageSession::close`]; dropping a
/// session without closing it leaks the underlying browser process.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Navigate to a URL and wait until the document's structural content
    /// has loaded. Any interstitial challenge is resolved transparently by
    /// the engine's script execution during this wait. No timeout beyond
    /// the engine's built-in navigation default is imposed.
    async fn goto(&self, url: &str) -> Result<()>;

    /// The fully rendered `document.body` HTML.
    async fn body_html(&self) -> Result<String>;

    /// Run a script in the page's own execution context and return its
    /// value. Promises are awaited, so an async IIFE works; network calls
    /// made by the script inherit the page's cookies and origin identity.
    async fn eval_json(&self, script: &str) -> Result<serde_json::Value>;

    /// Tear down the page and the browser process behind it.
    async fn close(self: Box<Self>) -> Result<()>;
}

impl std::fmt::Debug for dyn PageSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PageSession")
    }
}
