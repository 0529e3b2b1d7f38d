//! Chromium engine backed by chromiumoxide.

use super::{BrowserEngine, PageSession};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use tracing::debug;

/// Find the Chromium binary path.
///
/// Resolution order: `LPSE_CHROMIUM_PATH` env, the `~/.lpse/chromium/`
/// install directory, then the system PATH. Intended to run once at
/// startup; the resolved path is injected into [`ChromiumEngine`] rather
/// than re-resolved per scrape.
pub fn find_chromium() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("LPSE_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".lpse/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".lpse/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".lpse/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".lpse/chromium/chrome-linux64/chrome"),
                home.join(".lpse/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Chromium-backed [`BrowserEngine`].
///
/// Holds the pinned executable path resolved at startup. Each `launch()`
/// spawns a fresh headless process configured for a constrained execution
/// environment (no GPU, reduced sandbox).
pub struct ChromiumEngine {
    executable: Option<PathBuf>,
}

impl ChromiumEngine {
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self { executable }
    }

    /// Whether an executable was resolved at construction time.
    pub fn available(&self) -> bool {
        self.executable.is_some()
    }
}

#[async_trait]
impl BrowserEngine for ChromiumEngine {
    async fn launch(&self) -> Result<Box<dyn PageSession>> {
        let executable = self
            .executable
            .as_ref()
            .context("Chromium not found. Run `lpse install` or set LPSE_CHROMIUM_PATH.")?;

        let config = BrowserConfig::builder()
            .chrome_executable(executable)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        // Drain CDP events for the lifetime of the process.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                // The process is already up; kill it before surfacing the error.
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler_task.abort();
                return Err(anyhow::Error::from(e).context("failed to open page"));
            }
        };

        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler_task,
        }))
    }
}

/// One Chromium process with one page in it.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: tokio::task::JoinHandle<()>,
}

#[async_trait]
impl PageSession for ChromiumSession {
    async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("navigation to {url} failed"))?;
        // Let any challenge-driven redirect settle before the DOM is read.
        let _ = self.page.wait_for_navigation().await;
        Ok(())
    }

    async fn body_html(&self) -> Result<String> {
        let result = self
            .page
            .evaluate("document.body.innerHTML")
            .await
            .context("failed to read page body")?;
        result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert body HTML: {e:?}"))
    }

    async fn eval_json(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("in-page script execution failed")?;
        result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert script result: {e:?}"))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let ChromiumSession {
            mut browser,
            page,
            handler_task,
        } = *self;

        if let Err(e) = page.close().await {
            debug!("page close failed: {e}");
        }
        if let Err(e) = browser.close().await {
            debug!("browser close failed: {e}");
        }
        // Reap the process so no handle outlives the session.
        let _ = browser.wait().await;
        handler_task.abort();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn launch_without_executable_fails() {
        let engine = ChromiumEngine::new(None);
        assert!(!engine.available());
        let err = engine.launch().await.unwrap_err();
        assert!(err.to_string().contains("Chromium not found"));
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn navigate_read_body_and_close() {
        let engine = ChromiumEngine::new(find_chromium());
        let session = engine.launch().await.expect("failed to launch");

        session
            .goto("data:text/html,<h1>Hello</h1><p>World</p>")
            .await
            .expect("navigation failed");

        let html = session.body_html().await.expect("body_html failed");
        assert!(html.contains("<h1>Hello</h1>"));

        let value = session
            .eval_json("(async () => JSON.stringify({ n: 1 + 1 }))()")
            .await
            .expect("eval failed");
        assert_eq!(value.as_str().unwrap(), r#"{"n":2}"#);

        session.close().await.expect("close failed");
    }
}
