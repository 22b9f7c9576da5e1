//! Email delivery: an SMTP [`Mailer`] and the per-recipient fan-out.

use crate::config::MailConfig;
use crate::error::{AgentError, Result};
use crate::notify::message;
use crate::notify::traits::{Mailer, OutgoingEmail};
use crate::store::{RateReading, Recipient};
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

/// SMTP mailer using STARTTLS and password authentication.
///
/// Built without connection pooling: every [`Mailer::send`] opens its own
/// session and closes it once the message is handed over or fails.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailer {
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] if the sender address is invalid or the
    /// relay host cannot be used for STARTTLS.
    pub fn new(config: &MailConfig) -> Result<Self> {
        let sender: Mailbox = config
            .sender
            .parse()
            .map_err(|e| AgentError::Config(format!("invalid sender {:?}: {e}", config.sender)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AgentError::Config(format!("invalid SMTP host {:?}: {e}", config.host)))?
            .port(config.port)
            .credentials(Credentials::new(
                config.sender.clone(),
                config.password.clone(),
            ))
            .timeout(Some(Duration::from_secs(30)))
            .build();

        Ok(Self { transport, sender })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<()> {
        let to: Mailbox = email.to.parse()?;
        let message = Message::builder()
            .from(self.sender.clone())
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())?;
        self.transport.send(message).await?;
        Ok(())
    }
}

/// A recipient the batch could not reach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub to: String,
    pub reason: String,
}

/// Outcome of one email batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub attempted: usize,
    pub sent: usize,
    pub failures: Vec<DeliveryFailure>,
}

/// Sends the rate email to every recipient, one at a time.
pub struct EmailNotifier {
    mailer: Box<dyn Mailer>,
    signature: String,
}

impl EmailNotifier {
    pub fn new(mailer: Box<dyn Mailer>, signature: impl Into<String>) -> Self {
        Self {
            mailer,
            signature: signature.into(),
        }
    }

    /// Email `reading` to each recipient in order.
    ///
    /// A failed send is logged and recorded in the report; the remaining
    /// recipients are still attempted.
    pub async fn notify_all(
        &self,
        reading: &RateReading,
        recipients: &[Recipient],
    ) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for recipient in recipients {
            let email = message::rate_email(reading, recipient, &self.signature);
            report.attempted += 1;
            match self.mailer.send(&email).await {
                Ok(()) => {
                    report.sent += 1;
                    tracing::info!(to = %email.to, "email sent");
                }
                Err(e) => {
                    tracing::warn!(to = %email.to, error = %e, "email failed");
                    report.failures.push(DeliveryFailure {
                        to: email.to,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report
    }
}
