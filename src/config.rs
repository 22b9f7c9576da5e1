//! Agent configuration, read once from the environment at startup.
//!
//! Every component receives the slice of [`AgentConfig`] it needs; nothing
//! reads environment variables after [`AgentConfig::from_env`] returns.

use crate::error::{AgentError, Result};
use bcv_scrape::ScrapeConfig;
use std::fmt;
use std::path::PathBuf;

/// Source page URL.
pub const ENV_URL: &str = "BCV_URL";
/// Reading store path.
pub const ENV_STORE_PATH: &str = "EXCEL_PATH";
/// Recipient list path.
pub const ENV_RECIPIENTS_PATH: &str = "DESTINATARIOS_PATH";
/// Telegram bot token.
pub const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
/// Telegram chat id.
pub const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
/// Telegram API base URL.
pub const ENV_TELEGRAM_API_BASE: &str = "TELEGRAM_API_BASE";
/// SMTP relay host.
pub const ENV_SMTP_HOST: &str = "SMTP_HOST";
/// SMTP relay port.
pub const ENV_SMTP_PORT: &str = "SMTP_PORT";
/// Sender address, also the SMTP login.
pub const ENV_EMAIL_SENDER: &str = "EMAIL_ORIGEN";
/// SMTP password.
pub const ENV_EMAIL_PASSWORD: &str = "EMAIL_PASS";
/// Name closing every email.
pub const ENV_EMAIL_SIGNATURE: &str = "EMAIL_SIGNATURE";
/// Fetch timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "BCV_TIMEOUT_SECS";
/// Skip TLS verification for the source page.
pub const ENV_ACCEPT_INVALID_CERTS: &str = "BCV_ACCEPT_INVALID_CERTS";
/// Send a chat alert when the run fails.
pub const ENV_NOTIFY_ON_FAILURE: &str = "BCV_NOTIFY_ON_FAILURE";

const DEFAULT_STORE_PATH: &str = "data/tasa_bcv.xlsx";
const DEFAULT_RECIPIENTS_PATH: &str = "data/destinatarios.xlsx";
const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_SIGNATURE: &str = "Hans";

/// Top-level configuration for one agent run.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Where and how the rate is scraped.
    pub source: ScrapeConfig,
    /// Spreadsheet holding recorded readings.
    pub store_path: PathBuf,
    /// Spreadsheet listing email recipients.
    pub recipients_path: PathBuf,
    /// Chat destination.
    pub telegram: TelegramConfig,
    /// Outbound email settings.
    pub mail: MailConfig,
    /// On fatal failure, attempt one chat message describing the error.
    pub notify_on_failure: bool,
}

/// Telegram Bot API settings.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token (secret).
    pub bot_token: String,
    /// Destination chat id.
    pub chat_id: String,
    /// API base URL, without trailing slash.
    pub api_base: String,
}

/// SMTP settings and the signature used in message bodies.
#[derive(Clone)]
pub struct MailConfig {
    /// Relay host.
    pub host: String,
    /// Relay port (STARTTLS).
    pub port: u16,
    /// Sender address and SMTP username.
    pub sender: String,
    /// SMTP password (secret).
    pub password: String,
    /// Name closing every message.
    pub signature: String,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &redact(&self.bot_token))
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("sender", &self.sender)
            .field("password", &redact(&self.password))
            .field("signature", &self.signature)
            .finish()
    }
}

fn redact(s: &str) -> &str {
    if s.is_empty() { "" } else { "[REDACTED]" }
}

impl AgentConfig {
    /// Build the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] naming every missing required variable,
    /// or the first variable whose value cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Values are trimmed; empty values count as unset.
    ///
    /// # Errors
    ///
    /// Same as [`AgentConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let mut missing = Vec::new();
        let mut require = |key: &'static str| {
            get(key).unwrap_or_else(|| {
                missing.push(key);
                String::new()
            })
        };
        let bot_token = require(ENV_TELEGRAM_TOKEN);
        let chat_id = require(ENV_TELEGRAM_CHAT_ID);
        let sender = require(ENV_EMAIL_SENDER);
        let password = require(ENV_EMAIL_PASSWORD);
        if !missing.is_empty() {
            return Err(AgentError::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let defaults = ScrapeConfig::default();
        let source = ScrapeConfig {
            url: get(ENV_URL).unwrap_or_else(|| defaults.url.clone()),
            timeout_seconds: parse_or(
                get(ENV_TIMEOUT_SECS),
                ENV_TIMEOUT_SECS,
                defaults.timeout_seconds,
            )?,
            accept_invalid_certs: parse_bool_or(
                get(ENV_ACCEPT_INVALID_CERTS),
                ENV_ACCEPT_INVALID_CERTS,
                defaults.accept_invalid_certs,
            )?,
            ..defaults
        };
        source.validate()?;

        let api_base = get(ENV_TELEGRAM_API_BASE)
            .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.to_owned())
            .trim_end_matches('/')
            .to_owned();

        Ok(Self {
            source,
            store_path: PathBuf::from(
                get(ENV_STORE_PATH).unwrap_or_else(|| DEFAULT_STORE_PATH.to_owned()),
            ),
            recipients_path: PathBuf::from(
                get(ENV_RECIPIENTS_PATH).unwrap_or_else(|| DEFAULT_RECIPIENTS_PATH.to_owned()),
            ),
            telegram: TelegramConfig {
                bot_token,
                chat_id,
                api_base,
            },
            mail: MailConfig {
                host: get(ENV_SMTP_HOST).unwrap_or_else(|| DEFAULT_SMTP_HOST.to_owned()),
                port: parse_or(get(ENV_SMTP_PORT), ENV_SMTP_PORT, DEFAULT_SMTP_PORT)?,
                sender,
                password,
                signature: get(ENV_EMAIL_SIGNATURE)
                    .unwrap_or_else(|| DEFAULT_SIGNATURE.to_owned()),
            },
            notify_on_failure: parse_bool_or(
                get(ENV_NOTIFY_ON_FAILURE),
                ENV_NOTIFY_ON_FAILURE,
                true,
            )?,
        })
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, key: &str, default: T) -> Result<T> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| AgentError::Config(format!("{key} is not a valid number: {raw:?}"))),
    }
}

fn parse_bool_or(value: Option<String>, key: &str, default: bool) -> Result<bool> {
    let Some(raw) = value else {
        return Ok(default);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AgentError::Config(format!(
            "{key} must be a boolean (true/false), got {raw:?}"
        ))),
    }
}
