//! bcv-agent: records the official bolívar/dollar rate and tells people about it.
//!
//! One run is a short pipeline:
//! fetch rate page → parse → append to the workbook → chat + email
//!
//! # Architecture
//!
//! - **Source**: [`agent::RateSource`], by default scraping the central bank
//!   homepage through the `bcv-scrape` crate
//! - **Store**: [`store::ReadingStore`], an `.xlsx` workbook with one row per
//!   observation date
//! - **Notify**: a [`notify::ChatChannel`] for status messages and an
//!   [`notify::EmailNotifier`] that mails each recipient listed in a second
//!   workbook
//!
//! The store is idempotent on observation date, so the binary is safe to
//! schedule more often than the rate changes.

pub mod agent;
pub mod config;
pub mod error;
pub mod logging;
pub mod notify;
pub mod store;

pub use agent::{Agent, RateSource, RunOutcome, ScrapeSource};
pub use bcv_scrape::{RateQuote, ScrapeConfig};
pub use config::AgentConfig;
pub use error::{AgentError, Result};
