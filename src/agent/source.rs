//! Where the agent gets today's rate from.

use crate::error::Result;
use async_trait::async_trait;
use bcv_scrape::{RateQuote, ScrapeConfig};

/// A provider of the currently published rate.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetch the published rate. One attempt, no retries.
    async fn fetch(&self) -> Result<RateQuote>;
}

/// [`RateSource`] backed by scraping the publisher's homepage.
pub struct ScrapeSource {
    config: ScrapeConfig,
}

impl ScrapeSource {
    pub fn new(config: ScrapeConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RateSource for ScrapeSource {
    async fn fetch(&self) -> Result<RateQuote> {
        Ok(bcv_scrape::fetch_rate(&self.config).await?)
    }
}
