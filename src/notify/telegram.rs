use crate::config::TelegramConfig;
use crate::error::{AgentError, Result};
use crate::notify::traits::ChatChannel;
use async_trait::async_trait;
use std::time::Duration;

/// Telegram Bot API adapter (`sendMessage` only).
///
/// The bot token is part of the request path, so it is stripped from every
/// error this adapter returns.
pub struct TelegramAdapter {
    bot_token: String,
    chat_id: String,
    api_base: String,
    client: reqwest::Client,
}

impl TelegramAdapter {
    /// # Errors
    ///
    /// Returns [`AgentError::Notification`] if the HTTP client cannot be built.
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| AgentError::Notification(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            client,
        })
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }
}

#[async_trait]
impl ChatChannel for TelegramAdapter {
    fn id(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, text: &str) -> anyhow::Result<()> {
        if self.bot_token.trim().is_empty() {
            anyhow::bail!("telegram bot token is empty");
        }
        if self.chat_id.trim().is_empty() {
            anyhow::bail!("telegram chat_id is empty");
        }

        let response = self
            .client
            .post(self.send_message_url())
            .form(&[("chat_id", self.chat_id.as_str()), ("text", text)])
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("telegram request failed: {}", e.without_url()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let description = body
                .get("description")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("no description");
            anyhow::bail!("telegram send failed ({status}): {description}");
        }
        Ok(())
    }
}
