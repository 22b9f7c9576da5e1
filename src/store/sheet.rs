//! Single-worksheet `.xlsx` tables.
//!
//! A [`Sheet`] is a header row plus data rows of loosely typed [`Cell`]s,
//! anchored where the table starts in the worksheet. Reading goes through
//! `calamine`, writing through `rust_xlsxwriter`. A read followed by a write
//! keeps the table's position, its blank interior rows, and every cell's type
//! (dates, date-times, error values and formulas included). Number formats
//! other than the date ones are not carried over.

use crate::error::{AgentError, Result};
use calamine::{CellErrorType, Data, Reader, Xlsx, open_workbook};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_xlsxwriter::{Format, Formula, Workbook, Worksheet, XlsxError};
use std::path::Path;

const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// A date-formatted cell without a time component.
    Date(NaiveDate),
    /// A date-formatted cell with a time component.
    DateTime(NaiveDateTime),
    /// An error value such as `#N/A`.
    Error(CellErrorType),
    /// A formula (without the leading `=`) and its cached result as text.
    Formula { formula: String, result: String },
}

impl Cell {
    /// Text as a human would read it from the sheet.
    ///
    /// Whole numbers render without a fractional part so that phone numbers
    /// typed as numbers come back as `4141234567`, not `4141234567.0`.
    pub fn display_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.trim().to_owned(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Self::Error(e) => e.to_string(),
            Self::Formula { result, .. } => result.trim().to_owned(),
        }
    }

    /// Date as `YYYY-MM-DD`, for text cells that start with a date
    /// (`2024-05-01` or `2024-05-01 00:00:00`) and for date cells.
    pub fn date_key(&self) -> Option<String> {
        self.as_date().map(|d| d.format("%Y-%m-%d").to_string())
    }

    /// Parse the cell as a calendar date.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::DateTime(dt) => Some(dt.date()),
            Self::Text(s) | Self::Formula { result: s, .. } => {
                let prefix = s.trim().get(..10)?;
                NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
            }
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Cell for a formula read from a workbook, given its cached value.
    ///
    /// A formula that is just an error literal (`=#N/A`) is how error
    /// values are written back, so it reads as [`Cell::Error`].
    fn from_formula(formula: &str, cached: &Data) -> Self {
        let formula = formula.trim().trim_start_matches('=');
        if let Some(err) = error_literal(formula) {
            return Self::Error(err);
        }
        Self::Formula {
            formula: formula.to_owned(),
            result: Self::from(cached).display_text(),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Self::Empty,
            Data::String(s) => Self::Text(s.clone()),
            Data::Float(f) => Self::Number(*f),
            Data::Int(i) => Self::Number(*i as f64),
            Data::Bool(b) => Self::Bool(*b),
            Data::DateTime(dt) if dt.is_duration() => Self::Number(dt.as_f64()),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(ndt) if ndt.time() == NaiveTime::MIN => Self::Date(ndt.date()),
                Some(ndt) => Self::DateTime(ndt),
                None => Self::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => Self::Text(s.clone()),
            Data::Error(e) => Self::Error(e.clone()),
        }
    }
}

fn error_literal(text: &str) -> Option<CellErrorType> {
    [
        CellErrorType::Div0,
        CellErrorType::NA,
        CellErrorType::Name,
        CellErrorType::Null,
        CellErrorType::Num,
        CellErrorType::Ref,
        CellErrorType::Value,
        CellErrorType::GettingData,
    ]
    .into_iter()
    .find(|e| e.to_string() == text)
}

/// Whether every cell of `row` is empty.
pub fn is_blank_row(row: &[Cell]) -> bool {
    row.iter().all(Cell::is_empty)
}

/// A header row and its data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    /// Zero-based `(row, column)` of the first header cell.
    pub origin: (u32, u32),
    pub headers: Vec<String>,
    /// Data rows in sheet order, blank rows included.
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// An empty sheet at `A1` with the given header row.
    pub fn with_headers(headers: &[&str]) -> Self {
        Self {
            origin: (0, 0),
            headers: headers.iter().map(|h| (*h).to_owned()).collect(),
            rows: Vec::new(),
        }
    }

    /// Read the first worksheet of an `.xlsx` file.
    ///
    /// The first used row becomes the header row and the first used cell the
    /// sheet's origin.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Storage`] if the file cannot be opened or is not
    /// a readable workbook.
    pub fn read(path: &Path) -> Result<Self> {
        let unreadable = |e: calamine::XlsxError| {
            AgentError::Storage(format!("cannot read {}: {e}", path.display()))
        };

        let mut workbook: Xlsx<_> = open_workbook(path)
            .map_err(|e| AgentError::Storage(format!("cannot open {}: {e}", path.display())))?;
        let name = workbook.sheet_names().first().cloned().ok_or_else(|| {
            AgentError::Storage(format!("{} contains no worksheet", path.display()))
        })?;
        let range = workbook.worksheet_range(&name).map_err(unreadable)?;
        let formulas = workbook.worksheet_formula(&name).map_err(unreadable)?;

        let Some(origin) = range.start() else {
            return Ok(Self::default());
        };

        let mut rows = range.rows().enumerate().map(|(i, row)| {
            let r = offset(origin.0, i);
            row.iter()
                .enumerate()
                .map(|(j, data)| {
                    match formulas
                        .get_value((r, offset(origin.1, j)))
                        .filter(|f| !f.is_empty())
                    {
                        Some(formula) => Cell::from_formula(formula, data),
                        None => Cell::from(data),
                    }
                })
                .collect::<Vec<_>>()
        });
        let headers = rows
            .next()
            .map(|header| header.iter().map(Cell::display_text).collect())
            .unwrap_or_default();

        Ok(Self {
            origin,
            headers,
            rows: rows.collect(),
        })
    }

    /// Index of the column whose header matches `name` (ignoring surrounding
    /// whitespace and ASCII case).
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
    }

    /// Like [`Sheet::column`], but a missing column is a storage error.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Storage`] naming the column and the file.
    pub fn require_column(&self, name: &str, path: &Path) -> Result<usize> {
        self.column(name).ok_or_else(|| {
            AgentError::Storage(format!("{} has no {name:?} column", path.display()))
        })
    }

    /// Write the sheet to `path`, replacing any existing file atomically.
    ///
    /// The workbook is written to a temporary file in the destination
    /// directory and renamed over `path`, so a failed write leaves the
    /// previous file intact. The directory is created if needed.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Storage`] on any write or rename failure.
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        let dir = parent_dir(path);
        std::fs::create_dir_all(dir)
            .map_err(|e| AgentError::Storage(format!("cannot create {}: {e}", dir.display())))?;

        let tmp = tempfile::Builder::new()
            .prefix(".bcv-agent-")
            .suffix(".xlsx")
            .tempfile_in(dir)
            .map_err(|e| AgentError::Storage(format!("cannot create temp file: {e}")))?;

        self.to_workbook()?
            .save(tmp.path())
            .map_err(|e| AgentError::Storage(format!("cannot write workbook: {e}")))?;

        tmp.persist(path).map_err(|e| {
            AgentError::Storage(format!("cannot replace {}: {}", path.display(), e.error))
        })?;
        Ok(())
    }

    fn to_workbook(&self) -> Result<Workbook> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();
        let formats = CellFormats {
            date: Format::new().set_num_format(DATE_FORMAT),
            datetime: Format::new().set_num_format(DATETIME_FORMAT),
        };
        let worksheet = workbook.add_worksheet();
        let (top, left) = self.origin;

        for (col, header) in self.headers.iter().enumerate() {
            worksheet
                .write_string_with_format(top, col_index(left, col)?, header, &bold)
                .map_err(xlsx)?;
        }

        for (i, row) in self.rows.iter().enumerate() {
            let r = row_index(top, i + 1)?;
            for (col, cell) in row.iter().enumerate() {
                write_cell(worksheet, r, col_index(left, col)?, cell, &formats)?;
            }
        }

        Ok(workbook)
    }
}

struct CellFormats {
    date: Format,
    datetime: Format,
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    formats: &CellFormats,
) -> Result<()> {
    match cell {
        Cell::Empty => return Ok(()),
        Cell::Text(s) => worksheet.write_string(row, col, s),
        Cell::Number(n) => worksheet.write_number(row, col, *n),
        Cell::Bool(b) => worksheet.write_boolean(row, col, *b),
        Cell::Date(d) => worksheet.write_datetime_with_format(row, col, d, &formats.date),
        Cell::DateTime(dt) => {
            worksheet.write_datetime_with_format(row, col, dt, &formats.datetime)
        }
        Cell::Error(e) => worksheet.write_formula(
            row,
            col,
            Formula::new(format!("={e}")).set_result(e.to_string()),
        ),
        Cell::Formula { formula, result } => worksheet.write_formula(
            row,
            col,
            Formula::new(format!("={formula}")).set_result(result.as_str()),
        ),
    }
    .map_err(xlsx)?;
    Ok(())
}

fn xlsx(e: XlsxError) -> AgentError {
    AgentError::Storage(format!("xlsx: {e}"))
}

/// Directory holding `path`; `.` for bare file names.
pub(crate) fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

fn offset(base: u32, i: usize) -> u32 {
    base.saturating_add(u32::try_from(i).unwrap_or(u32::MAX))
}

fn row_index(top: u32, i: usize) -> Result<u32> {
    u32::try_from(i)
        .ok()
        .and_then(|i| top.checked_add(i))
        .ok_or_else(|| AgentError::Storage("too many rows for one worksheet".into()))
}

fn col_index(left: u32, col: usize) -> Result<u16> {
    u32::try_from(col)
        .ok()
        .and_then(|c| left.checked_add(c))
        .and_then(|c| u16::try_from(c).ok())
        .ok_or_else(|| AgentError::Storage("too many columns".into()))
}
