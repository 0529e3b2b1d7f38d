//! Runtime configuration.
//!
//! Everything the orchestrator and server need is resolved here once at
//! startup and injected; no other module reads the process environment.

use anyhow::{Context, Result};
use std::path::PathBuf;
use url::Url;

/// Default upstream portal (the kemhan LPSE instance).
pub const DEFAULT_BASE_URL: &str = "https://spse.inaproc.id/kemhan";

/// Default HTTP listen port.
pub const DEFAULT_HTTP_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream portal base URL, without a trailing slash.
    pub base_url: String,
    /// Explicit Chromium executable override (`LPSE_CHROMIUM_PATH`).
    pub chromium_path: Option<PathBuf>,
    /// Listen port for `lpse serve`.
    pub http_port: u16,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    ///
    /// `PORT` is honored as a fallback for `LPSE_HTTP_PORT` because the
    /// service is commonly deployed behind platforms that inject it.
    pub fn from_env() -> Result<Self> {
        let base_url = normalize_base_url(
            &std::env::var("LPSE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        )?;

        let chromium_path = std::env::var("LPSE_CHROMIUM_PATH")
            .ok()
            .map(PathBuf::from);

        let http_port = match std::env::var("LPSE_HTTP_PORT").or_else(|_| std::env::var("PORT")) {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("invalid listen port: {raw}"))?,
            Err(_) => DEFAULT_HTTP_PORT,
        };

        Ok(Self {
            base_url,
            chromium_path,
            http_port,
        })
    }
}

/// Validate a base URL and strip any trailing slash so path joins stay
/// predictable.
fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim_end_matches('/');
    let url = Url::parse(trimmed).with_context(|| format!("invalid base URL: {raw}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("base URL must be http(s): {raw}");
    }
    Ok(trimmed.to_string())
}
