//! Spreadsheet-backed stores: recorded readings and email recipients.

pub mod lock;
pub mod readings;
pub mod recipients;
pub mod sheet;

pub use readings::{RateReading, ReadingStore};
pub use recipients::{Recipient, load_recipients};
pub use sheet::{Cell, Sheet};
