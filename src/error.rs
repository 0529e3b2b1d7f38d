//! Failure taxonomy for the scrape pipeline.
//!
//! One variant per failure point in the orchestrated sequence. None of
//! these are retried internally; every variant propagates to the HTTP
//! boundary as a rejected operation.

use thiserror::Error;

/// The ways a scrape operation can fail.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The Chromium binary is missing or the process could not start.
    #[error("browser launch failed: {0}")]
    BrowserLaunch(anyhow::Error),

    /// The listing page (or its interstitial challenge) never settled.
    #[error("listing page navigation did not complete: {0}")]
    NavigationTimeout(anyhow::Error),

    /// The rendered markup did not contain the token assignment pattern.
    /// This is the primary upstream-drift signal: the site either changed
    /// its markup or the verification challenge was not actually passed.
    #[error("authenticityToken not found in page markup")]
    TokenExtraction,

    /// The data endpoint rejected the in-page request or returned a body
    /// that could not be parsed as a tender result set.
    #[error("tender data request failed: {0}")]
    DataRequest(anyhow::Error),
}

impl ScrapeError {
    /// Stable machine-readable kind string, surfaced in API failure
    /// responses so callers can tell markup drift from launch trouble.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BrowserLaunch(_) => "browser_launch",
            Self::NavigationTimeout(_) => "navigation_timeout",
            Self::TokenExtraction => "token_extraction",
            Self::DataRequest(_) => "data_request",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn kind_strings_are_stable() {
        assert_eq!(ScrapeError::BrowserLaunch(anyhow!("x")).kind(), "browser_launch");
        assert_eq!(
            ScrapeError::NavigationTimeout(anyhow!("x")).kind(),
            "navigation_timeout"
        );
        assert_eq!(ScrapeError::TokenExtraction.kind(), "token_extraction");
        assert_eq!(ScrapeError::DataRequest(anyhow!("x")).kind(), "data_request");
    }

    #[test]
    fn messages_carry_the_underlying_cause() {
        let err = ScrapeError::BrowserLaunch(anyhow!("no executable at /opt/chrome"));
        assert!(err.to_string().contains("/opt/chrome"));
    }
}
