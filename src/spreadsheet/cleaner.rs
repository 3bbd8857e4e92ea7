//! Statement cleaning: from a raw worksheet grid to a [`Statement`] table.
//!
//! A filing workbook holds one cover sheet, a handful of consolidated
//! statements, and dozens of footnote sheets. Cleaning keeps the cover sheet
//! and the statements, flattens merged period headers into single column
//! labels, splits the unit note out of the title cell, tags bold section
//! headers, and normalizes the label column — producing per-statement tables
//! plus the unit notes needed for later rescaling.
//!
//! Failure policy: one malformed sheet aborts only that statement. It is
//! logged and skipped so the other statements of the filing still clean; an
//! error is returned only when nothing survives.

use crate::error::{ReportError, Result};
use crate::spreadsheet::workbook::{RawSheet, RawWorkbook};
use crate::statement::{CATEGORY_MARKER, Cell, Statement};
use std::collections::HashMap;

/// Unit note per statement name, for one fiscal year's filing.
pub type UnitNotes = HashMap<String, String>;

/// The cleaned form of one fiscal year's filing.
#[derive(Debug, Clone)]
pub struct CleanedFiling {
    /// Cleaned statements in workbook order; the cover sheet comes first.
    pub statements: Vec<Statement>,
    /// Unit note captured from each statement's title cell.
    pub notes: UnitNotes,
}

// Sign-flip qualifiers stripped from row labels so the same line item
// aligns across years ("Other income (loss)" vs "Other income (gain)").
const LABEL_NOISE: [&str; 6] = [
    " (loss)",
    " (gain)",
    " (benefit)",
    " (losses)",
    " (gains)",
    " (expense)",
];

/// Cleans a whole raw workbook into statements plus unit notes.
pub fn clean(raw: RawWorkbook) -> Result<CleanedFiling> {
    if raw.sheets.is_empty() {
        return Err(ReportError::InputShape {
            sheet: "<workbook>".to_string(),
            reason: "workbook has no sheets".to_string(),
        });
    }

    let mut statements: Vec<Statement> = Vec::new();
    let mut notes = UnitNotes::new();

    for (index, sheet) in raw.sheets.into_iter().enumerate() {
        // The first sheet is always the cover/entity-information sheet; the
        // rest must look like a consolidated/condensed statement.
        if index > 0 && !is_statement_sheet(&sheet.name) {
            continue;
        }
        let sheet_name = sheet.name.clone();
        match clean_sheet(sheet) {
            Ok((statement, note)) => {
                notes.insert(statement.name.clone(), note);
                statements.push(statement);
            }
            Err(err) => {
                tracing::warn!(sheet = %sheet_name, error = %err, "skipping malformed statement");
            }
        }
    }

    if statements.is_empty() {
        return Err(ReportError::InputShape {
            sheet: "<workbook>".to_string(),
            reason: "no statement survived cleaning".to_string(),
        });
    }

    tracing::debug!(statements = statements.len(), "cleaned filing workbook");
    Ok(CleanedFiling { statements, notes })
}

fn is_statement_sheet(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.starts_with("condensed") || lower.starts_with("consolidated")
}

fn input_shape(sheet: &str, reason: &str) -> ReportError {
    ReportError::InputShape {
        sheet: sheet.to_string(),
        reason: reason.to_string(),
    }
}

fn clean_sheet(mut sheet: RawSheet) -> Result<(Statement, String)> {
    resolve_merges(&mut sheet);

    // The title cell reads "<Statement Name> - <Unit Note>".
    let title = sheet
        .value(0, 0)
        .ok_or_else(|| input_shape(&sheet.name, "empty title cell"))?;
    let (name, note) = title
        .split_once(" - ")
        .ok_or_else(|| input_shape(&sheet.name, "title cell has no unit note"))?;
    let name = name.trim().to_string();
    let note = note.trim().to_string();

    tag_category_rows(&mut sheet);
    collapse_header_rows(&mut sheet);

    if sheet.row_count() < 2 {
        return Err(input_shape(&sheet.name, "no data rows below the header"));
    }

    let statement = to_statement(&sheet, &name);
    Ok((statement, note))
}

/// Flattens horizontal merged header cells.
///
/// A horizontally merged cell in the header carries a period descriptor like
/// "12 Months Ended" spanning several date columns. The text is appended onto
/// the cell directly below each spanned column (`" - "` separated) and the
/// merged cell itself is cleared, leaving one header row per column.
fn resolve_merges(sheet: &mut RawSheet) {
    for merge in std::mem::take(&mut sheet.merges) {
        if !merge.is_horizontal() {
            continue;
        }
        let merged_text = match sheet.value(merge.start_row, merge.start_col) {
            Some(text) => text.to_string(),
            None => continue,
        };
        let below = merge.start_row + 1;
        if below >= sheet.row_count() {
            continue;
        }
        for col in merge.columns() {
            if let Some(cell) = sheet.cell_mut(below, col) {
                cell.value = Some(match cell.value.as_deref().map(str::trim) {
                    Some(existing) if !existing.is_empty() => {
                        format!("{existing} - {merged_text}")
                    }
                    _ => merged_text.clone(),
                });
            }
        }
        if let Some(cell) = sheet.cell_mut(merge.start_row, merge.start_col) {
            cell.value = None;
        }
    }
}

/// Marks bold label cells as category rows and de-bolds empty bold cells.
fn tag_category_rows(sheet: &mut RawSheet) {
    for row in 1..sheet.row_count() {
        if let Some(cell) = sheet.cell_mut(row, 0) {
            if !cell.bold {
                continue;
            }
            match &mut cell.value {
                Some(value) => value.push_str(CATEGORY_MARKER),
                None => cell.bold = false,
            }
        }
    }
}

/// Removes the title row once its content has been captured.
///
/// If the first data column of the title row is empty the row was purely
/// structural and is dropped. Otherwise any straggler "Months Ended" text
/// (a merge the resolver did not see) is pushed down onto the period cell
/// below before the row is dropped. When neither case applies the title row
/// itself is the header row and stays.
fn collapse_header_rows(sheet: &mut RawSheet) {
    if sheet.value(0, 1).is_none() {
        sheet.delete_row(0);
        return;
    }

    let mut extra_header = false;
    for col in 1..sheet.column_count() {
        let header = match sheet.value(0, col) {
            Some(v) if v.contains("Months Ended") => v.to_string(),
            _ => continue,
        };
        if let Some(cell) = sheet.cell_mut(1, col) {
            cell.value = Some(match cell.value.as_deref().map(str::trim) {
                Some(existing) if !existing.is_empty() => {
                    format!("{existing} - {header}")
                }
                _ => header,
            });
            extra_header = true;
        }
    }
    if extra_header {
        sheet.delete_row(0);
    }
}

fn scrub_label(label: &str) -> String {
    let mut scrubbed = label.to_string();
    for noise in LABEL_NOISE {
        scrubbed = scrubbed.replace(noise, "");
    }
    scrubbed
}

/// Builds the statement table from a cleaned grid: row 0 is the header,
/// column 0 the row labels, and every later row a labeled data row. Rows
/// that carry neither a label nor a value are dropped.
fn to_statement(sheet: &RawSheet, name: &str) -> Statement {
    let mut last_col = sheet.column_count();
    while last_col > 1 {
        let empty = sheet.value(0, last_col - 1).is_none()
            && (1..sheet.row_count()).all(|r| sheet.value(r, last_col - 1).is_none());
        if !empty {
            break;
        }
        last_col -= 1;
    }

    let columns: Vec<String> = (1..last_col)
        .map(|col| sheet.value(0, col).unwrap_or_default().to_string())
        .collect();

    let mut statement = Statement::new(name, columns);
    for row in 1..sheet.row_count() {
        let label = sheet.value(row, 0).map(scrub_label);
        let cells: Vec<Cell> = (1..last_col)
            .map(|col| Cell::from_raw(sheet.value(row, col)))
            .collect();
        if label.is_none() && cells.iter().all(Cell::is_missing) {
            continue;
        }
        statement.push_row(label.unwrap_or_default(), cells);
    }
    statement.dedup_rows();
    statement
}
