use crate::error::{ReportError, Result};
use std::io::Cursor;

/// One spreadsheet cell as read from disk: its text (if any) and whether the
/// cell is rendered bold. Numeric cells carry their canonical string form;
/// parsing into numbers happens later, in the cleaner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCell {
    pub value: Option<String>,
    pub bold: bool,
}

impl RawCell {
    pub fn text(value: impl Into<String>) -> Self {
        RawCell {
            value: Some(value.into()),
            bold: false,
        }
    }

    pub fn bold_text(value: impl Into<String>) -> Self {
        RawCell {
            value: Some(value.into()),
            bold: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }
}

/// An inclusive rectangular merged-cell range, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRange {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl MergeRange {
    /// A merge spanning a single row — the header-period case.
    pub fn is_horizontal(&self) -> bool {
        self.start_row == self.end_row
    }

    pub fn columns(&self) -> impl Iterator<Item = usize> {
        self.start_col..=self.end_col
    }
}

/// One worksheet: a dense 0-based grid plus its merged ranges.
#[derive(Debug, Clone, Default)]
pub struct RawSheet {
    pub name: String,
    pub grid: Vec<Vec<RawCell>>,
    pub merges: Vec<MergeRange>,
}

impl RawSheet {
    pub fn new(name: impl Into<String>) -> Self {
        RawSheet {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn row_count(&self) -> usize {
        self.grid.len()
    }

    pub fn column_count(&self) -> usize {
        self.grid.first().map_or(0, Vec::len)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&RawCell> {
        self.grid.get(row).and_then(|r| r.get(col))
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut RawCell> {
        self.grid.get_mut(row).and_then(|r| r.get_mut(col))
    }

    /// Trimmed cell text, with empty strings collapsed to `None`.
    pub fn value(&self, row: usize, col: usize) -> Option<&str> {
        self.cell(row, col)
            .and_then(|c| c.value.as_deref())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Removes a whole row, shifting the rows below it up.
    pub fn delete_row(&mut self, row: usize) {
        if row < self.grid.len() {
            self.grid.remove(row);
        }
    }
}

/// An in-memory image of one fiscal year's filing workbook, in file order.
///
/// Ephemeral: exists only while that year's filing is being cleaned.
#[derive(Debug, Clone, Default)]
pub struct RawWorkbook {
    pub sheets: Vec<RawSheet>,
}

impl RawWorkbook {
    /// Decodes xlsx bytes into the grid model, capturing cell text, bold
    /// flags, and merged ranges.
    pub fn from_xlsx_bytes(bytes: &[u8]) -> Result<RawWorkbook> {
        let book = umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(bytes), true)
            .map_err(|e| ReportError::Spreadsheet(format!("xlsx decode failed: {e}")))?;

        let mut sheets = Vec::with_capacity(book.get_sheet_count());
        for index in 0..book.get_sheet_count() {
            let ws = book
                .get_sheet(&index)
                .ok_or_else(|| ReportError::Spreadsheet(format!("missing sheet {index}")))?;

            let (max_col, max_row) = ws.get_highest_column_and_row();
            let mut sheet = RawSheet::new(ws.get_name());
            for row in 1..=max_row {
                let mut cells = Vec::with_capacity(max_col as usize);
                for col in 1..=max_col {
                    let cell = match ws.get_cell((col, row)) {
                        Some(cell) => {
                            let text = cell.get_value().to_string();
                            RawCell {
                                value: if text.is_empty() { None } else { Some(text) },
                                bold: cell
                                    .get_style()
                                    .get_font()
                                    .as_ref()
                                    .map(|font| *font.get_bold())
                                    .unwrap_or(false),
                            }
                        }
                        None => RawCell::default(),
                    };
                    cells.push(cell);
                }
                sheet.grid.push(cells);
            }

            for range in ws.get_merge_cells() {
                if let Some(merge) = parse_a1_range(&range.get_range()) {
                    sheet.merges.push(merge);
                }
            }
            sheets.push(sheet);
        }

        Ok(RawWorkbook { sheets })
    }
}

/// Parses an A1-style coordinate like `"B7"` into 0-based `(row, col)`.
pub(crate) fn parse_a1(coord: &str) -> Option<(usize, usize)> {
    let split = coord.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = coord.split_at(split);
    if letters.is_empty() || digits.is_empty() {
        return None;
    }
    let mut col: usize = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    let row: usize = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col - 1))
}

/// Parses an A1-style range like `"B1:D1"`. A bare coordinate is treated as
/// a single-cell range.
pub(crate) fn parse_a1_range(range: &str) -> Option<MergeRange> {
    let (start, end) = match range.split_once(':') {
        Some((s, e)) => (s, e),
        None => (range, range),
    };
    let (start_row, start_col) = parse_a1(start.trim())?;
    let (end_row, end_col) = parse_a1(end.trim())?;
    Some(MergeRange {
        start_row: start_row.min(end_row),
        start_col: start_col.min(end_col),
        end_row: start_row.max(end_row),
        end_col: start_col.max(end_col),
    })
}
