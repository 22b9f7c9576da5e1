//! The reading store: one row per published observation date.
//!
//! Layout (first worksheet):
//!
//! | Fecha BCV | Tasa | Fecha consulta |
//! |-----------|------|----------------|
//! | `2024-05-01` (text) | `36.45` (number) | `2024-05-01` (text) |
//!
//! Rows are only ever appended. Every append re-reads the whole sheet and
//! rewrites it with all prior rows and cells intact.

use crate::error::{AgentError, Result};
use crate::store::lock::{self, StoreLock};
use crate::store::sheet::{Cell, Sheet, parent_dir};
use bcv_scrape::RateQuote;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Header of the observation date column.
pub const COL_OBSERVATION_DATE: &str = "Fecha BCV";
/// Header of the rate column.
pub const COL_RATE: &str = "Tasa";
/// Header of the query date column.
pub const COL_QUERY_DATE: &str = "Fecha consulta";

/// A published rate together with the local date it was fetched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateReading {
    pub observation_date: NaiveDate,
    pub rate: f64,
    pub query_date: NaiveDate,
}

impl RateReading {
    /// Stamp a fetched quote with the date it was queried.
    pub fn new(quote: RateQuote, query_date: NaiveDate) -> Self {
        Self {
            observation_date: quote.observation_date,
            rate: quote.rate,
            query_date,
        }
    }

    /// The quote part of this reading.
    pub fn quote(&self) -> RateQuote {
        RateQuote {
            observation_date: self.observation_date,
            rate: self.rate,
        }
    }

    /// Observation date in `YYYY-MM-DD` form.
    pub fn date_key(&self) -> String {
        self.observation_date.format("%Y-%m-%d").to_string()
    }
}

/// Spreadsheet-backed, append-only store of [`RateReading`]s.
#[derive(Debug, Clone)]
pub struct ReadingStore {
    path: PathBuf,
    lock_timeout: Duration,
}

impl ReadingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: lock::WAIT_TIMEOUT,
        }
    }

    /// How long [`ReadingStore::append`] waits for another run's lock.
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All rows that parse as readings, in store order. A missing store
    /// yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Storage`] if the file exists but cannot be read
    /// or lacks the expected columns.
    pub fn readings(&self) -> Result<Vec<RateReading>> {
        let sheet = self.load()?;
        let date_col = sheet.require_column(COL_OBSERVATION_DATE, &self.path)?;
        let rate_col = sheet.require_column(COL_RATE, &self.path)?;
        let query_col = sheet.require_column(COL_QUERY_DATE, &self.path)?;

        let readings = sheet
            .rows
            .iter()
            .filter_map(|row| {
                let reading = RateReading {
                    observation_date: row.get(date_col)?.as_date()?,
                    rate: cell_rate(row.get(rate_col)?)?,
                    query_date: row.get(query_col)?.as_date()?,
                };
                Some(reading)
            })
            .collect();
        Ok(readings)
    }

    /// Whether a reading for `date` is already stored.
    ///
    /// # Errors
    ///
    /// Same as [`ReadingStore::readings`].
    pub fn contains(&self, date: NaiveDate) -> Result<bool> {
        let sheet = self.load()?;
        let date_col = sheet.require_column(COL_OBSERVATION_DATE, &self.path)?;
        Ok(has_date(&sheet, date_col, date))
    }

    /// Append `reading` unless its observation date is already stored.
    ///
    /// Returns `true` if the reading was written, `false` if the date was
    /// already present (the file is left untouched).
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Storage`] if the directory cannot be created,
    /// another run still holds the store lock when the lock timeout expires
    /// (stale locks are evicted first), the existing file cannot be read, or
    /// the rewrite fails. On error the previous file is left intact.
    pub fn append(&self, reading: &RateReading) -> Result<bool> {
        let dir = parent_dir(&self.path);
        std::fs::create_dir_all(dir)
            .map_err(|e| AgentError::Storage(format!("cannot create {}: {e}", dir.display())))?;

        let _lock = StoreLock::acquire_within(&self.path, self.lock_timeout)?;

        let mut sheet = self.load()?;
        let date_col = sheet.require_column(COL_OBSERVATION_DATE, &self.path)?;
        let rate_col = sheet.require_column(COL_RATE, &self.path)?;
        let query_col = sheet.require_column(COL_QUERY_DATE, &self.path)?;

        if has_date(&sheet, date_col, reading.observation_date) {
            tracing::info!(date = %reading.date_key(), "reading already recorded");
            return Ok(false);
        }

        let mut row = vec![Cell::Empty; sheet.headers.len()];
        row[date_col] = Cell::Text(reading.date_key());
        row[rate_col] = Cell::Number(reading.rate);
        row[query_col] = Cell::Text(reading.query_date.format("%Y-%m-%d").to_string());
        sheet.rows.push(row);

        sheet.write_atomic(&self.path)?;
        tracing::info!(
            date = %reading.date_key(),
            rate = reading.rate,
            rows = sheet.rows.len(),
            store = %self.path.display(),
            "reading recorded"
        );
        Ok(true)
    }

    /// The stored sheet, or a fresh one with the standard headers if the
    /// file does not exist yet or has no header row.
    fn load(&self) -> Result<Sheet> {
        let fresh = || Sheet::with_headers(&[COL_OBSERVATION_DATE, COL_RATE, COL_QUERY_DATE]);
        if !self.path.exists() {
            return Ok(fresh());
        }
        let sheet = Sheet::read(&self.path)?;
        if sheet.headers.iter().all(|h| h.is_empty()) && sheet.rows.is_empty() {
            return Ok(fresh());
        }
        Ok(sheet)
    }
}

fn has_date(sheet: &Sheet, date_col: usize, date: NaiveDate) -> bool {
    let key = date.format("%Y-%m-%d").to_string();
    sheet
        .rows
        .iter()
        .filter_map(|row| row.get(date_col))
        .any(|cell| cell.date_key().as_deref() == Some(key.as_str()))
}

fn cell_rate(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) => Some(*n),
        Cell::Text(s) | Cell::Formula { result: s, .. } => bcv_scrape::parse_decimal(s).ok(),
        _ => None,
    }
}
