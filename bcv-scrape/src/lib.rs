//! # bcv-scrape
//!
//! Fetches the official USD exchange rate published on the Banco Central de
//! Venezuela homepage.
//!
//! ## Design
//!
//! - One GET per call, no retries; the caller decides what a failure means
//! - The rate and its publication date are read from fixed CSS locations
//!   (configurable through [`ScrapeConfig`])
//! - Comma decimals are normalized before conversion (`"36,45"` → `36.45`)
//! - Missing markup is an explicit [`ScrapeError::Parse`], never a panic

pub mod config;
pub mod error;
pub mod http;
pub mod parse;
pub mod types;

pub use config::ScrapeConfig;
pub use error::{Result, ScrapeError};
pub use parse::{parse_decimal, parse_rate_page};
pub use types::RateQuote;

/// Fetch the rate page and extract the published rate.
///
/// # Errors
///
/// Returns [`ScrapeError::Config`] for an invalid configuration,
/// [`ScrapeError::Http`] if the request fails or the server answers with a
/// non-success status, and [`ScrapeError::Parse`] if the page does not carry
/// the expected markup.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> bcv_scrape::Result<()> {
/// let quote = bcv_scrape::fetch_rate(&bcv_scrape::ScrapeConfig::default()).await?;
/// println!("{}: Bs {}", quote.observation_date, quote.rate);
/// # Ok(())
/// # }
/// ```
pub async fn fetch_rate(config: &ScrapeConfig) -> Result<RateQuote> {
    config.validate()?;
    tracing::debug!(url = %config.url, "fetching rate page");

    let client = http::build_client(config)?;

    let response = client
        .get(config.url.trim())
        .send()
        .await
        .map_err(|e| ScrapeError::Http(format!("request failed: {e}")))?
        .error_for_status()
        .map_err(|e| ScrapeError::Http(format!("bad status: {e}")))?;

    let html = response
        .text()
        .await
        .map_err(|e| ScrapeError::Http(format!("response read failed: {e}")))?;

    tracing::trace!(bytes = html.len(), "rate page received");

    parse_rate_page(&html, config)
}
