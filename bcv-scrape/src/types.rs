//! The value extracted from the rate page.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An exchange rate as published, before it is stamped with a query date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    /// Date the rate was officially published.
    pub observation_date: NaiveDate,
    /// Bolívares per US dollar.
    pub rate: f64,
}

impl RateQuote {
    /// Observation date in `YYYY-MM-DD` form.
    pub fn date_key(&self) -> String {
        self.observation_date.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for RateQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: Bs {}", self.date_key(), self.rate)
    }
}
