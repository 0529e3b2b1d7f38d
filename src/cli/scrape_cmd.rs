//! One-shot scrape from the terminal.

use crate::config::Config;
use crate::renderer::chromium::{find_chromium, ChromiumEngine};
use crate::renderer::BrowserEngine;
use crate::scraper::{current_year, TenderScraper};
use anyhow::Result;
use std::sync::Arc;

pub async fn run(year: Option<i32>, json: bool) -> Result<()> {
    crate::cli::init_tracing();

    let config = Config::from_env()?;
    let executable = config.chromium_path.clone().or_else(find_chromium);
    let engine: Arc<dyn BrowserEngine> = Arc::new(ChromiumEngine::new(executable));
    let scraper = TenderScraper::new(engine, config.base_url.clone());

    let year = year.unwrap_or_else(current_year);
    let set = scraper.scrape(year).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&set)?);
    } else {
        println!(
            "year {year}: {} of {} records match, showing {} rows",
            set.records_filtered,
            set.records_total,
            set.data.len()
        );
    }
    Ok(())
}
