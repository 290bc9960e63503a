//! Spreadsheet output of the extracted records.
//!
//! One worksheet named `Articles`: a bold header row, then one row per record
//! in extraction order.

use crate::models::ArticleRecord;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

pub const SHEET_NAME: &str = "Articles";

pub const COLUMNS: [&str; 6] = [
    "Title",
    "Date",
    "Description",
    "Image Filename",
    "Search Count",
    "Contains Money",
];

/// Build the workbook for `records` in memory.
pub fn records_to_workbook(records: &[ArticleRecord]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, name) in COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &bold)?;
    }

    for (i, r) in records.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &r.title)?;
        sheet.write_string(row, 1, r.published_at.format("%Y-%m-%d %H:%M:%S").to_string())?;
        sheet.write_string(row, 2, &r.description)?;
        if let Some(name) = &r.image_filename {
            sheet.write_string(row, 3, name)?;
        }
        sheet.write_number(row, 4, r.search_count as f64)?;
        sheet.write_boolean(row, 5, r.contains_money)?;
    }

    workbook.save_to_buffer()
}

/// Write `records` as an `.xlsx` workbook to `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn write_workbook(records: &[ArticleRecord], path: &Path) -> Result<(), Box<dyn Error>> {
    let bytes = records_to_workbook(records)?;
    fs::write(path, bytes).await?;
    info!("Wrote spreadsheet");
    Ok(())
}
