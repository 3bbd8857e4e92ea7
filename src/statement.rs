//! Core table types for cleaned financial statements.
//!
//! A [`Statement`] is one financial table (balance sheet, income statement,
//! cover sheet, ...) with an ordered row-label axis, an ordered column-label
//! axis, and a dense value grid. Everything downstream of the spreadsheet
//! cleaner operates on these instead of raw worksheet cells, so the row and
//! column alignment done by the merger is checked by the type system rather
//! than by dict-shape conventions.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Suffix appended to row labels of bold section-header rows by the cleaner.
///
/// Survives every later pipeline stage so consumers can tell structural rows
/// from data rows without re-inspecting cell formatting.
pub const CATEGORY_MARKER: &str = " - CATEGORY";

/// Separator used to disambiguate duplicate row or column labels.
pub(crate) const DUP_MARKER: &str = " dp_";

/// A single table cell.
///
/// `Missing` is the join sentinel: it means "no value reported for this
/// (row, column)" and serializes as JSON null. It is only turned into `0.0`
/// by the merger's explicit normalize step, never during conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    /// Parses a raw spreadsheet string into a cell value.
    ///
    /// Numeric-looking values become [`Cell::Number`]; anything else is kept
    /// verbatim as text. `None` maps to [`Cell::Missing`].
    pub fn from_raw(value: Option<&str>) -> Self {
        match value {
            None => Cell::Missing,
            Some(s) => match s.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => Cell::Number(n),
                _ => Cell::Text(s.to_string()),
            },
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// True for a numeric zero. Text and missing cells are not zero.
    pub fn is_zero(&self) -> bool {
        matches!(self, Cell::Number(n) if *n == 0.0)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Cell::Number(n) => serializer.serialize_f64(*n),
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Missing => serializer.serialize_none(),
        }
    }
}

struct CellVisitor;

impl<'de> Visitor<'de> for CellVisitor {
    type Value = Cell;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a number, a string, or null")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Cell, E> {
        Ok(Cell::Number(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Cell, E> {
        Ok(Cell::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Cell, E> {
        Ok(Cell::Number(v as f64))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Cell, E> {
        Ok(Cell::Text(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Cell, E> {
        Ok(Cell::Text(v.to_string()))
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Cell, E> {
        Ok(Cell::Missing)
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Cell, E> {
        Ok(Cell::Missing)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> std::result::Result<Cell, D::Error> {
        d.deserialize_any(CellVisitor)
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Cell, D::Error> {
        deserializer.deserialize_any(CellVisitor)
    }
}

/// One cleaned financial statement: a named table with ordered row labels,
/// ordered column labels, and a row-major value grid.
///
/// Invariants:
/// - `grid.len() == rows.len()` and every `grid[r].len() == columns.len()`
/// - row labels are unique once [`dedup_rows`](Statement::dedup_rows) has run
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub name: String,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub grid: Vec<Vec<Cell>>,
}

impl Statement {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Statement {
            name: name.into(),
            rows: Vec::new(),
            columns,
            grid: Vec::new(),
        }
    }

    /// Appends a row; the cell count must match the column count.
    pub fn push_row(&mut self, label: impl Into<String>, cells: Vec<Cell>) {
        debug_assert_eq!(cells.len(), self.columns.len());
        self.rows.push(label.into());
        self.grid.push(cells);
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.grid[row][col]
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Position of a row label, if present.
    pub fn row_index(&self, label: &str) -> Option<usize> {
        self.rows.iter().position(|r| r == label)
    }

    /// Disambiguates duplicate row labels in place with the `" dp_N"` rule.
    pub fn dedup_rows(&mut self) {
        dedup_labels(&mut self.rows);
    }

    /// Disambiguates duplicate column labels in place with the `" dp_N"` rule.
    pub fn dedup_columns(&mut self) {
        dedup_labels(&mut self.columns);
    }
}

/// Suffixes repeated labels with `" dp_N"` until all labels are unique.
///
/// Pass 1 appends `" dp_1"` to every second-or-later occurrence of a label;
/// if collisions remain (three-or-more-way duplicates), pass 2 appends
/// `" dp_2"` to the still-duplicated ones, and so on. Running this on an
/// already-unique label set is a no-op, so applying it twice never produces
/// `" dp_1 dp_1"` chains out of clean input.
pub(crate) fn dedup_labels(labels: &mut Vec<String>) {
    let mut pass = 1;
    loop {
        let mut seen: Vec<&str> = Vec::with_capacity(labels.len());
        let mut dups: Vec<usize> = Vec::new();
        for (i, label) in labels.iter().enumerate() {
            if seen.contains(&label.as_str()) {
                dups.push(i);
            } else {
                seen.push(label);
            }
        }
        if dups.is_empty() {
            return;
        }
        for i in dups {
            labels[i].push_str(&format!("{}{}", DUP_MARKER, pass));
        }
        pass += 1;
    }
}

/// Strips a trailing `" dp_N"` disambiguation suffix, if any.
pub(crate) fn strip_dup_suffix(label: &str) -> &str {
    if let Some(pos) = label.rfind(DUP_MARKER) {
        let tail = &label[pos + DUP_MARKER.len()..];
        if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit()) {
            return &label[..pos];
        }
    }
    label
}

/// Numeric multiplier implied by a statement's unit note.
///
/// EDGAR statement headers carry text like "In Thousands, except Share data";
/// the reported figures must be scaled accordingly before cross-year numbers
/// are comparable.
pub fn unit_multiplier(note: &str) -> f64 {
    if note.contains("Thousands") {
        1_000.0
    } else if note.contains("Millions") {
        1_000_000.0
    } else if note.contains("Billions") {
        1_000_000_000.0
    } else {
        1.0
    }
}

/// Rows that report share counts or per-share amounts are never rescaled:
/// their unit note exemption is spelled out in the row label itself.
pub fn is_share_row(label: &str) -> bool {
    label.contains("(in shares)") || label.contains("(in dollars per share)")
}
