//! Read-only recipient list for the email notifier.

use crate::error::Result;
use crate::store::sheet::{Cell, Sheet, is_blank_row};
use std::path::Path;

/// Header of the address column.
pub const COL_EMAIL: &str = "email destino";
/// Header of the display name column.
pub const COL_NAME: &str = "nombre destinatario";
/// Header of the contact phrase column.
pub const COL_CONTACT: &str = "texto con telefono para comentarios";

/// One email recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub email_address: String,
    pub display_name: String,
    /// How the recipient should reach the sender, e.g. `el 0414-1234567`.
    pub contact_phrase: String,
}

/// Load recipients from the first worksheet of `path`.
///
/// Rows without an address are skipped with a warning.
///
/// # Errors
///
/// Returns [`crate::AgentError::Storage`] if the file cannot be read or a
/// required column is missing.
pub fn load_recipients(path: &Path) -> Result<Vec<Recipient>> {
    let sheet = Sheet::read(path)?;
    let email_col = sheet.require_column(COL_EMAIL, path)?;
    let name_col = sheet.require_column(COL_NAME, path)?;
    let contact_col = sheet.require_column(COL_CONTACT, path)?;

    let text_at = |row: &[Cell], col: usize| {
        row.get(col).map(|c| c.display_text()).unwrap_or_default()
    };

    let mut recipients = Vec::with_capacity(sheet.rows.len());
    for (i, row) in sheet.rows.iter().enumerate() {
        if is_blank_row(row) {
            continue;
        }
        let email_address = text_at(row, email_col);
        if email_address.is_empty() {
            // +2: one for the header row, one for 1-based numbering.
            tracing::warn!(
                row = sheet.origin.0 as usize + i + 2,
                file = %path.display(),
                "recipient row without address skipped"
            );
            continue;
        }
        recipients.push(Recipient {
            email_address,
            display_name: text_at(row, name_col),
            contact_phrase: text_at(row, contact_col),
        });
    }

    tracing::debug!(count = recipients.len(), "recipients loaded");
    Ok(recipients)
}
