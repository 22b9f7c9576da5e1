//! Error types for the bcv-scrape crate.
//!
//! Messages are stable strings suitable for logs and chat alerts. They never
//! include response bodies, only the failing step and the underlying cause.

/// Errors that can occur while fetching or parsing the rate page.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// The HTTP request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The page was fetched but the expected markup was missing or malformed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid scrape configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for bcv-scrape results.
pub type Result<T> = std::result::Result<T, ScrapeError>;
