//! The run pipeline: fetch → record → notify.
//!
//! Steps run strictly in order. A fetch or store failure ends the run (after
//! an optional best-effort chat alert); notification failures never do.
//! Emails go out only when the reading is new, so re-running for a date that
//! is already on file does not mail subscribers twice.

pub mod source;

pub use source::{RateSource, ScrapeSource};

use crate::config::AgentConfig;
use crate::error::Result;
use crate::notify::{
    self, ChatChannel, DeliveryReport, EmailNotifier, SmtpMailer, TelegramAdapter, message,
};
use crate::store::{RateReading, ReadingStore, load_recipients};
use bcv_scrape::RateQuote;
use chrono::Local;
use std::path::PathBuf;

/// What a successful run did.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The reading was new and has been stored.
    ///
    /// `delivery` is `None` when the recipient list could not be loaded.
    Recorded {
        reading: RateReading,
        delivery: Option<DeliveryReport>,
    },
    /// The observation date was already on file; nothing was written or mailed.
    AlreadyRecorded { quote: RateQuote },
}

/// A fully wired agent, ready to run once.
pub struct Agent {
    source: Box<dyn RateSource>,
    store: ReadingStore,
    recipients_path: PathBuf,
    chat: Box<dyn ChatChannel>,
    email: EmailNotifier,
    notify_on_failure: bool,
}

impl Agent {
    pub fn new(
        source: Box<dyn RateSource>,
        store: ReadingStore,
        recipients_path: impl Into<PathBuf>,
        chat: Box<dyn ChatChannel>,
        email: EmailNotifier,
    ) -> Self {
        Self {
            source,
            store,
            recipients_path: recipients_path.into(),
            chat,
            email,
            notify_on_failure: true,
        }
    }

    /// Whether a fatal failure triggers one best-effort chat alert.
    #[must_use]
    pub fn with_failure_notification(mut self, enabled: bool) -> Self {
        self.notify_on_failure = enabled;
        self
    }

    /// Wire the production components (scraper, Telegram, SMTP).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or the SMTP transport cannot be
    /// built from `config`.
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let source = ScrapeSource::new(config.source.clone());
        let chat = TelegramAdapter::new(&config.telegram)?;
        let mailer = SmtpMailer::new(&config.mail)?;
        let email = EmailNotifier::new(Box::new(mailer), config.mail.signature.clone());

        Ok(Self::new(
            Box::new(source),
            ReadingStore::new(config.store_path.clone()),
            config.recipients_path.clone(),
            Box::new(chat),
            email,
        )
        .with_failure_notification(config.notify_on_failure))
    }

    /// Run the pipeline once.
    ///
    /// # Errors
    ///
    /// Returns the fetch or store error that ended the run. Notification
    /// failures are logged and never returned.
    pub async fn run(&self) -> Result<RunOutcome> {
        match self.run_steps().await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::error!(error = %e, "run failed");
                if self.notify_on_failure {
                    notify::send_best_effort(self.chat.as_ref(), &message::run_failed(&e)).await;
                }
                Err(e)
            }
        }
    }

    async fn run_steps(&self) -> Result<RunOutcome> {
        let quote = self.source.fetch().await?;
        tracing::info!(date = %quote.date_key(), rate = quote.rate, "rate fetched");

        let reading = RateReading::new(quote, Local::now().date_naive());
        if !self.store.append(&reading)? {
            notify::send_best_effort(self.chat.as_ref(), &message::rate_already_recorded(&quote))
                .await;
            return Ok(RunOutcome::AlreadyRecorded { quote });
        }

        notify::send_best_effort(self.chat.as_ref(), &message::rate_recorded(&quote)).await;

        let delivery = match load_recipients(&self.recipients_path) {
            Ok(recipients) => {
                let report = self.email.notify_all(&reading, &recipients).await;
                tracing::info!(
                    attempted = report.attempted,
                    sent = report.sent,
                    failed = report.failures.len(),
                    "email batch finished"
                );
                Some(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "recipient list unavailable, no emails sent");
                None
            }
        };

        Ok(RunOutcome::Recorded { reading, delivery })
    }
}
