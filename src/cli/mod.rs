//! CLI subcommand implementations for the `lpse` binary.

pub mod doctor;
pub mod install_cmd;
pub mod scrape_cmd;
pub mod serve_cmd;

/// Initialize tracing with an env-filter, defaulting to info-level logs
/// for this crate.
pub(crate) fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lpse_scraper=info".parse().unwrap()),
        )
        .init();
}
