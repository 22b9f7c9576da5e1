//! Outbound notifications: chat status messages and subscriber emails.
//!
//! Notification is best-effort. Nothing in this module lets a delivery
//! failure abort a run; failures are logged and, for email, reported back.

pub mod email;
pub mod message;
pub mod telegram;
pub mod traits;

pub use email::{DeliveryFailure, DeliveryReport, EmailNotifier, SmtpMailer};
pub use telegram::TelegramAdapter;
pub use traits::{ChatChannel, Mailer, OutgoingEmail};

/// Send `text` through `channel`, logging instead of returning failures.
///
/// Returns whether the message was delivered.
pub async fn send_best_effort(channel: &dyn ChatChannel, text: &str) -> bool {
    match channel.send(text).await {
        Ok(()) => {
            tracing::info!(channel = channel.id(), "chat notification sent");
            true
        }
        Err(e) => {
            tracing::warn!(channel = channel.id(), error = %e, "chat notification failed");
            false
        }
    }
}
