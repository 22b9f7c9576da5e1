//! Single-run binary: fetch today's rate, record it, notify.
//!
//! Configured entirely through environment variables; meant to be started by
//! cron or a systemd timer. Exits non-zero when the rate could not be fetched
//! or recorded.

use bcv_agent::{Agent, AgentConfig, RunOutcome, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let log_dir = logging::log_dir_from_env();
    let _log_guard = logging::init(log_dir.as_deref())?;

    let config = AgentConfig::from_env().map_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
        e
    })?;
    tracing::debug!(?config, "configuration loaded");

    let agent = Agent::from_config(&config)?;

    match agent.run().await? {
        RunOutcome::Recorded { reading, delivery } => {
            match delivery {
                Some(report) => tracing::info!(
                    date = %reading.date_key(),
                    rate = reading.rate,
                    emails_sent = report.sent,
                    emails_failed = report.failures.len(),
                    "rate recorded"
                ),
                None => tracing::warn!(
                    date = %reading.date_key(),
                    rate = reading.rate,
                    "rate recorded, emails skipped"
                ),
            }
        }
        RunOutcome::AlreadyRecorded { quote } => {
            tracing::info!(date = %quote.date_key(), "rate already recorded, nothing to do");
        }
    }

    Ok(())
}
