//! Shared fakes and fixtures for integration tests.

use async_trait::async_trait;
use bcv_agent::agent::RateSource;
use bcv_agent::notify::{ChatChannel, EmailNotifier, Mailer, OutgoingEmail};
use bcv_agent::store::recipients::{COL_CONTACT, COL_EMAIL, COL_NAME};
use bcv_agent::store::{Cell, ReadingStore, Sheet};
use bcv_agent::{Agent, AgentError, RateQuote};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) fn quote(y: i32, m: u32, d: u32, rate: f64) -> RateQuote {
    RateQuote {
        observation_date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        rate,
    }
}

/// A source that always returns the same quote, or always fails.
pub(crate) enum FixedSource {
    Quote(RateQuote),
    Unreachable,
}

#[async_trait]
impl RateSource for FixedSource {
    async fn fetch(&self) -> bcv_agent::Result<RateQuote> {
        match self {
            Self::Quote(q) => Ok(*q),
            Self::Unreachable => Err(AgentError::Transport(
                "connection refused: www.bcv.org.ve".into(),
            )),
        }
    }
}

/// Chat channel that records every message; optionally always fails.
#[derive(Clone, Default)]
pub(crate) struct RecordingChat {
    pub sent: Arc<Mutex<Vec<String>>>,
    pub down: bool,
}

impl RecordingChat {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatChannel for RecordingChat {
    fn id(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, text: &str) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(text.to_owned());
        if self.down {
            anyhow::bail!("chat service unavailable");
        }
        Ok(())
    }
}

/// Mailer that records every attempted email; fails for listed addresses.
#[derive(Clone, Default)]
pub(crate) struct ScriptedMailer {
    pub fail_for: Vec<String>,
    pub attempts: Arc<Mutex<Vec<OutgoingEmail>>>,
}

impl ScriptedMailer {
    pub(crate) fn attempted_addresses(&self) -> Vec<String> {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.to.clone())
            .collect()
    }
}

#[async_trait]
impl Mailer for ScriptedMailer {
    async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<()> {
        self.attempts.lock().unwrap().push(email.clone());
        if self.fail_for.contains(&email.to) {
            anyhow::bail!("550 mailbox unavailable");
        }
        Ok(())
    }
}

/// Write a recipients workbook with one row per `(email, name, contact)`.
pub(crate) fn write_recipients(dir: &Path, rows: &[(&str, &str, &str)]) -> PathBuf {
    let path = dir.join("destinatarios.xlsx");
    let mut sheet = Sheet::with_headers(&[COL_EMAIL, COL_NAME, COL_CONTACT]);
    for (email, name, contact) in rows {
        sheet.rows.push(vec![
            Cell::Text((*email).to_owned()),
            Cell::Text((*name).to_owned()),
            Cell::Text((*contact).to_owned()),
        ]);
    }
    sheet.write_atomic(&path).unwrap();
    path
}

pub(crate) fn store_path(dir: &Path) -> PathBuf {
    dir.join("data").join("tasa_bcv.xlsx")
}

/// An agent over fakes, with the store and recipients under `dir`.
pub(crate) fn agent(
    dir: &Path,
    source: FixedSource,
    chat: &RecordingChat,
    mailer: &ScriptedMailer,
) -> Agent {
    Agent::new(
        Box::new(source),
        ReadingStore::new(store_path(dir)).with_lock_timeout(Duration::from_millis(200)),
        dir.join("destinatarios.xlsx"),
        Box::new(chat.clone()),
        EmailNotifier::new(Box::new(mailer.clone()), "Hans"),
    )
}
