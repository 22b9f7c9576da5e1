//! The client used for the one page request per fetch.
//!
//! Requests identify as a desktop browser asking for Spanish HTML.

use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use rand::Rng;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use std::time::Duration;

/// Desktop browser agents used when no User-Agent is configured.
const BROWSER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64; rv:127.0) Gecko/20100101 Firefox/127.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
];

const MAX_REDIRECTS: usize = 3;

/// User-Agent for a fetch: the configured one, else a browser agent.
pub fn user_agent(config: &ScrapeConfig) -> String {
    match config.user_agent.as_deref().map(str::trim) {
        Some(custom) if !custom.is_empty() => custom.to_owned(),
        _ => {
            let i = rand::thread_rng().gen_range(0..BROWSER_AGENTS.len());
            BROWSER_AGENTS[i].to_owned()
        }
    }
}

fn page_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("es-VE,es;q=0.9,en;q=0.5"),
    );
    headers
}

/// Build the client for fetching the rate page.
///
/// # Errors
///
/// Returns [`ScrapeError::Http`] if the client cannot be constructed.
pub fn build_client(config: &ScrapeConfig) -> Result<reqwest::Client, ScrapeError> {
    if config.accept_invalid_certs {
        tracing::warn!(url = %config.url, "TLS certificate verification disabled");
    }

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(user_agent(config))
        .default_headers(page_headers())
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()
        .map_err(|e| ScrapeError::Http(format!("failed to build HTTP client: {e}")))
}
