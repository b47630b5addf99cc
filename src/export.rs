//! Export helpers for writing user records to a spreadsheet.
//!
//! - `save_users_xlsx` writes a single `Users` worksheet: bold header row,
//!   one row per record, `Enabled` as a native boolean cell.
//! - `save_users_csv` writes the same columns as CSV.
//! - `save_users` picks the format from the output extension (`.csv` or xlsx).
use std::path::Path;

use csv::Writer;
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::record::UserRecord;

/// Name of the single worksheet in xlsx exports.
pub const SHEET_NAME: &str = "Users";

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("xlsx: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Xlsx,
    Csv,
}

impl OutputFormat {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => OutputFormat::Csv,
            _ => OutputFormat::Xlsx,
        }
    }
}

pub fn save_users<P: AsRef<Path>>(users: &[UserRecord], path: P) -> Result<(), WriteError> {
    match OutputFormat::from_path(&path) {
        OutputFormat::Xlsx => save_users_xlsx(users, path),
        OutputFormat::Csv => save_users_csv(users, path),
    }
}

pub fn save_users_xlsx<P: AsRef<Path>>(users: &[UserRecord], path: P) -> Result<(), WriteError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    for (col, name) in UserRecord::HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &header)?;
    }
    for (i, u) in users.iter().enumerate() {
        let row = i as u32 + 1;
        for (col, value) in u.text_columns().iter().enumerate() {
            sheet.write_string(row, col as u16, *value)?;
        }
        sheet.write_boolean(row, 5, u.enabled)?;
        sheet.write_string(row, 6, u.last_logon.as_str())?;
    }
    sheet.set_freeze_panes(1, 0)?;
    sheet.autofit();
    workbook.save(path.as_ref())?;
    Ok(())
}

pub fn save_users_csv<P: AsRef<Path>>(users: &[UserRecord], path: P) -> Result<(), WriteError> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(UserRecord::HEADERS)?;
    for u in users {
        let [sam, display, email, title, department] = u.text_columns();
        let enabled = if u.enabled { "true" } else { "false" };
        wtr.write_record([
            sam,
            display,
            email,
            title,
            department,
            enabled,
            u.last_logon.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
