//! Error types for the rate agent.

use bcv_scrape::ScrapeError;

/// Top-level error type for a single agent run.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Network or HTTP failure while reaching the rate publisher.
    #[error("transport error: {0}")]
    Transport(String),

    /// The publisher's page did not carry the expected markup.
    #[error("parse error: {0}")]
    Parse(String),

    /// Spreadsheet read, write or lock failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Chat or email delivery failure.
    #[error("notification error: {0}")]
    Notification(String),

    /// Missing or invalid configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl From<ScrapeError> for AgentError {
    fn from(err: ScrapeError) -> Self {
        match err {
            ScrapeError::Http(msg) => Self::Transport(msg),
            ScrapeError::Parse(msg) => Self::Parse(msg),
            ScrapeError::Config(msg) => Self::Config(msg),
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AgentError>;
