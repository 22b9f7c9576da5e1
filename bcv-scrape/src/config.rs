//! Scrape configuration with defaults matching the BCV homepage.
//!
//! [`ScrapeConfig`] controls where the rate is fetched from, how long the
//! request may take, and which page locations hold the rate and its date.

use crate::error::ScrapeError;
use scraper::Selector;

/// Default source page.
pub const DEFAULT_URL: &str = "https://www.bcv.org.ve/";

/// Element whose text is the USD rate.
pub const DEFAULT_RATE_SELECTOR: &str = "div#dolar div.centrado strong";

/// Element carrying the publication date.
pub const DEFAULT_DATE_SELECTOR: &str = "span.date-display-single";

/// Attribute of the date element holding an ISO-8601 timestamp.
pub const DEFAULT_DATE_ATTRIBUTE: &str = "content";

/// Configuration for a single rate fetch.
///
/// Use [`Default::default()`] for the BCV homepage, or override individual
/// fields (tests point `url` at a mock server).
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Page to fetch.
    pub url: String,
    /// HTTP request timeout in seconds.
    pub timeout_seconds: u64,
    /// Skip TLS certificate verification. The publisher has served broken
    /// certificate chains in the past; keep this off unless that recurs.
    pub accept_invalid_certs: bool,
    /// Custom User-Agent string. If `None`, rotates through a built-in list
    /// of realistic browser User-Agents.
    pub user_agent: Option<String>,
    /// CSS selector for the rate element.
    pub rate_selector: String,
    /// CSS selector for the date element.
    pub date_selector: String,
    /// Attribute of the date element to read.
    pub date_attribute: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_owned(),
            timeout_seconds: 10,
            accept_invalid_certs: false,
            user_agent: None,
            rate_selector: DEFAULT_RATE_SELECTOR.to_owned(),
            date_selector: DEFAULT_DATE_SELECTOR.to_owned(),
            date_attribute: DEFAULT_DATE_ATTRIBUTE.to_owned(),
        }
    }
}

impl ScrapeConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `url` must be a non-empty absolute http(s) URL
    /// - `timeout_seconds` must be greater than 0
    /// - both selectors must be valid CSS
    /// - `date_attribute` must not be empty
    pub fn validate(&self) -> Result<(), ScrapeError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ScrapeError::Config("url must not be empty".into()));
        }
        let parsed = url::Url::parse(url)
            .map_err(|e| ScrapeError::Config(format!("invalid url {url:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScrapeError::Config(format!(
                "url scheme must be http or https, got {}",
                parsed.scheme()
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(ScrapeError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        compile_selector(&self.rate_selector, "rate")?;
        compile_selector(&self.date_selector, "date")?;
        if self.date_attribute.trim().is_empty() {
            return Err(ScrapeError::Config(
                "date_attribute must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Compile a CSS selector, labelling failures with `what`.
pub(crate) fn compile_selector(css: &str, what: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css)
        .map_err(|e| ScrapeError::Config(format!("invalid {what} selector {css:?}: {e:?}")))
}
