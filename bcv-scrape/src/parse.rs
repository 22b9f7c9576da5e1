//! Extraction of the rate and its publication date from the page HTML.
//!
//! Kept separate from the network code so it can be tested against
//! captured markup.

use crate::config::{compile_selector, ScrapeConfig};
use crate::error::ScrapeError;
use crate::types::RateQuote;
use chrono::NaiveDate;
use scraper::Html;

/// Parse the rate page into a [`RateQuote`].
///
/// # Errors
///
/// Returns [`ScrapeError::Parse`] if the rate element, the date element, or
/// the date attribute is missing, or if either value is malformed.
/// Returns [`ScrapeError::Config`] if a configured selector is invalid.
pub fn parse_rate_page(html: &str, config: &ScrapeConfig) -> Result<RateQuote, ScrapeError> {
    let document = Html::parse_document(html);

    let rate_sel = compile_selector(&config.rate_selector, "rate")?;
    let date_sel = compile_selector(&config.date_selector, "date")?;

    let rate_text = document
        .select(&rate_sel)
        .next()
        .map(|el| el.text().collect::<String>())
        .ok_or_else(|| {
            ScrapeError::Parse(format!(
                "rate element not found ({})",
                config.rate_selector
            ))
        })?;
    let rate = parse_decimal(&rate_text)?;

    let date_el = document.select(&date_sel).next().ok_or_else(|| {
        ScrapeError::Parse(format!(
            "date element not found ({})",
            config.date_selector
        ))
    })?;
    let date_raw = date_el.value().attr(&config.date_attribute).ok_or_else(|| {
        ScrapeError::Parse(format!(
            "date element has no {:?} attribute",
            config.date_attribute
        ))
    })?;
    let observation_date = parse_observation_date(date_raw)?;

    tracing::debug!(date = %observation_date, rate, "rate page parsed");
    Ok(RateQuote {
        observation_date,
        rate,
    })
}

/// Convert a published decimal string to a number.
///
/// The publisher uses a comma as decimal separator (`"36,45"`); a point is
/// accepted as well. When both appear, the last one is the decimal separator
/// and the other is a thousands separator. Whitespace anywhere is ignored.
///
/// # Errors
///
/// Returns [`ScrapeError::Parse`] if the text is not a finite positive number.
pub fn parse_decimal(raw: &str) -> Result<f64, ScrapeError> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(ScrapeError::Parse("rate text is empty".into()));
    }

    let normalized = match (compact.rfind(','), compact.rfind('.')) {
        (Some(comma), Some(point)) if comma > point => compact.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => compact.replace(',', ""),
        (Some(_), None) => compact.replace(',', "."),
        _ => compact,
    };

    let value: f64 = normalized
        .parse()
        .map_err(|_| ScrapeError::Parse(format!("rate is not a number: {:?}", raw.trim())))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(ScrapeError::Parse(format!(
            "rate must be a positive number, got {value}"
        )));
    }
    Ok(value)
}

/// Read the `YYYY-MM-DD` prefix of a published timestamp
/// (e.g. `2024-05-02T00:00:00-04:00`).
///
/// # Errors
///
/// Returns [`ScrapeError::Parse`] if the prefix is not a valid calendar date.
pub fn parse_observation_date(raw: &str) -> Result<NaiveDate, ScrapeError> {
    let trimmed = raw.trim();
    let prefix = trimmed
        .get(..10)
        .ok_or_else(|| ScrapeError::Parse(format!("date too short: {trimmed:?}")))?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
        .map_err(|e| ScrapeError::Parse(format!("invalid date {prefix:?}: {e}")))
}
