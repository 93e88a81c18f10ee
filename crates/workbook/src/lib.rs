// In crates/workbook/src/lib.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use analytics::{Classification, EnrichedRecord, SummaryTotals};
use rust_decimal::prelude::ToPrimitive;
use umya_spreadsheet::{Spreadsheet, Worksheet};

pub mod error;
pub mod layout;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use layout::{CellValue, JournalRow};

use layout::{HEADERS, TICKET_COLUMN};

/// An xlsx workbook held in memory between `open` and `save`.
///
/// The whole file is read on open and rewritten on save.
pub struct Journal {
    path: PathBuf,
    book: Spreadsheet,
}

/// What an append did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AppendReport {
    pub appended: usize,
    pub skipped: usize,
}

/// Reads the workbook at `path` into memory.
pub fn open(path: &Path) -> Result<Journal> {
    let book = umya_spreadsheet::reader::xlsx::read(path).map_err(|e| Error::OpenFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(Journal { path: path.to_path_buf(), book })
}

impl Journal {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.book
            .get_sheet_collection()
            .iter()
            .map(|sheet| sheet.get_name().to_string())
            .collect()
    }

    fn sheet_mut(&mut self, sheet: &str) -> Result<&mut Worksheet> {
        let available = self.sheet_names();
        self.book
            .get_sheet_by_name_mut(sheet)
            .ok_or_else(|| Error::SheetNotFound { sheet: sheet.to_string(), available })
    }

    /// Tickets already present in the ticket column, below the header row.
    pub fn existing_tickets(&self, sheet: &str) -> Result<HashSet<String>> {
        let worksheet = self.book.get_sheet_by_name(sheet).ok_or_else(|| Error::SheetNotFound {
            sheet: sheet.to_string(),
            available: self.sheet_names(),
        })?;
        Ok(ticket_set(worksheet))
    }

    /// Appends one row per record whose ticket is not in the sheet yet.
    ///
    /// Existing rows are never modified. An empty sheet gets a header row first.
    pub fn append_records(&mut self, sheet: &str, records: &[EnrichedRecord]) -> Result<AppendReport> {
        let worksheet = self.sheet_mut(sheet)?;
        let mut seen = ticket_set(worksheet);

        if worksheet.get_highest_row() == 0 {
            for (i, title) in HEADERS.iter().enumerate() {
                worksheet.get_cell_mut((i as u32 + 1, 1)).set_value(*title);
            }
        }

        let mut report = AppendReport::default();
        for record in records {
            let row = JournalRow::from_record(record);
            if !seen.insert(row.ticket.clone()) {
                tracing::debug!(ticket = %row.ticket, "Ticket already in sheet, skipping.");
                report.skipped += 1;
                continue;
            }

            let row_index = worksheet.get_highest_row() + 1;
            for (i, value) in row.cells.iter().enumerate() {
                let col = i as u32 + 1;
                let cell = worksheet.get_cell_mut((col, row_index));
                match value {
                    CellValue::Text(text) => {
                        cell.set_value(text.clone());
                    }
                    CellValue::Number(number) => {
                        cell.set_value_number(*number);
                    }
                    CellValue::Empty => {}
                }
                worksheet.get_style_mut((col, row_index)).set_background_color(row.fill);
            }
            report.appended += 1;
        }

        tracing::info!(sheet, appended = report.appended, skipped = report.skipped, "Rows appended.");
        Ok(report)
    }

    /// Writes the win/lose/breakeven block to `sheet`, creating the sheet when missing.
    ///
    /// The block occupies A1:D5 and is overwritten on every call.
    pub fn write_summary(&mut self, sheet: &str, totals: &SummaryTotals) -> Result<()> {
        if self.book.get_sheet_by_name(sheet).is_none() {
            self.book.new_sheet(sheet).map_err(|reason| Error::SheetCreateFailed {
                sheet: sheet.to_string(),
                reason: reason.to_string(),
            })?;
        }
        let worksheet = self.sheet_mut(sheet)?;

        for (i, title) in ["Category", "Count", "Result", "Share %"].iter().enumerate() {
            worksheet.get_cell_mut((i as u32 + 1, 1)).set_value(*title);
        }

        let rows = [
            ("Win", Some(Classification::Win)),
            ("Lose", Some(Classification::Lose)),
            ("Breakeven", Some(Classification::Breakeven)),
            ("Total", None),
        ];
        for (offset, (label, class)) in rows.into_iter().enumerate() {
            let row = offset as u32 + 2;
            let (count, result, share) = match class {
                Some(class) => (totals.count(class), totals.result(class), totals.percentage(class)),
                None => (totals.total_count, totals.total_result, if totals.total_count > 0 { 100.0 } else { 0.0 }),
            };
            worksheet.get_cell_mut((1, row)).set_value(label);
            worksheet.get_cell_mut((2, row)).set_value_number(count);
            worksheet.get_cell_mut((3, row)).set_value_number(result.to_f64().unwrap_or(0.0));
            worksheet.get_cell_mut((4, row)).set_value_number((share * 100.0).round() / 100.0);
        }

        Ok(())
    }

    /// Rewrites the whole file.
    ///
    /// The workbook is written to a sibling temporary file first and renamed
    /// over the original, so a failed write leaves the original untouched.
    pub fn save(&self) -> Result<()> {
        let tmp = self.path.with_extension("xlsx.tmp");
        if let Err(e) = umya_spreadsheet::writer::xlsx::write(&self.book, &tmp) {
            let _ = std::fs::remove_file(&tmp);
            return Err(Error::SaveFailed { path: self.path.clone(), reason: e.to_string() });
        }
        std::fs::rename(&tmp, &self.path)?;
        tracing::info!(path = %self.path.display(), "Workbook saved.");
        Ok(())
    }
}

fn ticket_set(worksheet: &Worksheet) -> HashSet<String> {
    (2..=worksheet.get_highest_row())
        .filter_map(|row| worksheet.get_cell((TICKET_COLUMN, row)))
        .map(|cell| cell.get_value().trim().to_string())
        .filter(|ticket| !ticket.is_empty())
        .collect()
}
