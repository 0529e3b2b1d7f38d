//! Start the HTTP scrape service.

use crate::config::Config;
use crate::renderer::chromium::{find_chromium, ChromiumEngine};
use crate::renderer::BrowserEngine;
use crate::rest::{self, AppState};
use crate::scraper::TenderScraper;
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn run(port_override: Option<u16>) -> Result<()> {
    crate::cli::init_tracing();

    let config = Config::from_env()?;
    let port = port_override.unwrap_or(config.http_port);

    let executable = config.chromium_path.clone().or_else(find_chromium);
    match &executable {
        Some(path) => info!("using Chromium at {}", path.display()),
        None => warn!(
            "Chromium not found; scrape requests will fail until `lpse install` is run"
        ),
    }
    let engine = Arc::new(ChromiumEngine::new(executable));
    let chromium_available = engine.available();
    let engine: Arc<dyn BrowserEngine> = engine;
    let scraper = TenderScraper::new(engine, config.base_url.clone());
    let state = Arc::new(AppState {
        scraper,
        chromium_available,
    });

    info!(
        "serving tender data from {} on port {port}",
        config.base_url
    );
    rest::serve(port, state).await
}
