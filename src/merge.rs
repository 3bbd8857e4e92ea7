//! Multi-year report merging, normalization, filtering, and summary
//! statistics — the heart of the crate.
//!
//! A [`MergedReport`] moves through the stages
//! `join -> normalize -> filter / analyze`; every stage is a pure function
//! producing a new value, so each is testable in isolation and no stage can
//! corrupt the table another stage is iterating.
//!
//! Joining concatenates each statement's per-year columns in year order and
//! unions the row axes, filling holes with [`Cell::Missing`] — turning blanks
//! into zeros is an explicit normalize decision, never a join artifact.
//! Normalization also reconciles the duplicate columns produced when fiscal
//! year boundaries overlap: consecutive annual filings frequently restate the
//! same period, and the newer filing wins with the older one backfilling any
//! zeros it left.

use crate::convert::{statement_to_nested, workbook_to_nested};
use crate::error::{ReportError, Result};
use crate::nested::{NestedReport, OrderedMap};
use crate::statement::{Cell, Statement, is_share_row, strip_dup_suffix, unit_multiplier};
use std::collections::HashMap;

/// Unit notes per fiscal year: year label -> statement name -> note.
pub type UnitNotesByYear = HashMap<String, HashMap<String, String>>;

/// The cover sheet rescales only this field; everything else on it is an
/// identifier, not a monetary amount.
const PUBLIC_FLOAT_ROW: &str = "Entity Public Float";

const SUMMARY_COLUMNS: [&str; 3] = ["min", "max", "mean"];

/// One column of a merged wide table: its label plus the fiscal year of the
/// filing it came from (`None` once a report has been reconstituted from its
/// persisted form, which does not record provenance).
#[derive(Debug, Clone, PartialEq)]
pub struct WideColumn {
    pub label: String,
    pub year: Option<String>,
}

/// One statement's wide table: the union of that statement's columns across
/// all input years, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    pub name: String,
    pub rows: Vec<String>,
    pub columns: Vec<WideColumn>,
    pub grid: Vec<Vec<Cell>>,
}

impl WideTable {
    fn to_statement(&self) -> Statement {
        Statement {
            name: self.name.clone(),
            rows: self.rows.clone(),
            columns: self.columns.iter().map(|c| c.label.clone()).collect(),
            grid: self.grid.clone(),
        }
    }
}

/// Ordered row selection: statement name -> row indices to keep.
///
/// Index order is the user's chosen display order and is preserved verbatim.
/// Statements absent from the instruction are dropped from the filtered
/// output entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterInstruction {
    selections: Vec<(String, Vec<usize>)>,
}

impl FilterInstruction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, statement: impl Into<String>, rows: Vec<usize>) {
        self.selections.push((statement.into(), rows));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.selections
            .iter()
            .map(|(name, rows)| (name.as_str(), rows.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Parses the form shape submitted by a selection UI:
    /// `{"Sheet Name": [0, 1, "2"], ...}`. Indices may arrive as JSON numbers
    /// or as decimal strings; anything else is an invalid selection.
    pub fn from_json(form_data: &str) -> Result<Self> {
        let parsed: OrderedMap<Vec<serde_json::Value>> = serde_json::from_str(form_data)?;
        let mut instruction = FilterInstruction::new();
        for (statement, raw_rows) in parsed.iter() {
            let mut rows = Vec::with_capacity(raw_rows.len());
            for value in raw_rows {
                let index = match value {
                    serde_json::Value::Number(n) => n.as_u64().map(|n| n as usize),
                    serde_json::Value::String(s) => s.trim().parse::<usize>().ok(),
                    _ => None,
                };
                match index {
                    Some(index) => rows.push(index),
                    None => {
                        return Err(ReportError::InvalidSelection {
                            statement: statement.to_string(),
                            reason: format!("'{value}' is not a row index"),
                        });
                    }
                }
            }
            instruction.insert(statement, rows);
        }
        Ok(instruction)
    }
}

/// A multi-year joined report, one wide table per statement.
///
/// The first table is the cover/entity-information sheet whenever the input
/// filings carried one (they always do on EDGAR).
#[derive(Debug, Clone, PartialEq)]
pub struct MergedReport {
    tables: Vec<WideTable>,
}

impl MergedReport {
    /// Joins per-year nested reports into one wide table per statement.
    ///
    /// `per_year` must be ordered oldest to newest; columns are concatenated
    /// in that order, keeping each year's own column order. A statement
    /// missing from some years simply contributes no columns for those years.
    /// Missing (row, column) cells are [`Cell::Missing`].
    pub fn join(per_year: &[(String, NestedReport)]) -> Result<MergedReport> {
        if per_year.is_empty() {
            return Err(ReportError::EmptyYearSet);
        }

        let mut order: Vec<String> = Vec::new();
        for (_, report) in per_year {
            for name in report.keys() {
                if !order.iter().any(|n| n == name) {
                    order.push(name.to_string());
                }
            }
        }

        let mut tables = Vec::with_capacity(order.len());
        for name in &order {
            let mut rows: Vec<String> = Vec::new();
            let mut columns: Vec<WideColumn> = Vec::new();

            for (year, report) in per_year {
                let Some(table) = report.get(name) else { continue };
                for (label, by_row) in table.iter() {
                    columns.push(WideColumn {
                        label: label.to_string(),
                        year: Some(year.clone()),
                    });
                    for row in by_row.keys() {
                        if !rows.iter().any(|r| r == row) {
                            rows.push(row.to_string());
                        }
                    }
                }
            }

            let mut grid = vec![Vec::with_capacity(columns.len()); rows.len()];
            for (_, report) in per_year {
                let Some(table) = report.get(name) else { continue };
                for (_, by_row) in table.iter() {
                    for (r, row) in rows.iter().enumerate() {
                        let cell = by_row.get(row).cloned().unwrap_or(Cell::Missing);
                        grid[r].push(cell);
                    }
                }
            }

            tables.push(WideTable {
                name: name.clone(),
                rows,
                columns,
                grid,
            });
        }

        tracing::debug!(statements = tables.len(), years = per_year.len(), "joined report");
        Ok(MergedReport { tables })
    }

    /// Rebuilds a merged report from its persisted nested form.
    ///
    /// Column-year provenance is not stored, so a reconstituted report can be
    /// filtered and analyzed but normalize will no longer rescale units.
    pub fn from_nested(report: &NestedReport) -> MergedReport {
        let tables = report
            .iter()
            .map(|(name, table)| {
                let statement = crate::convert::nested_to_statement(name, table);
                WideTable {
                    name: statement.name,
                    rows: statement.rows,
                    columns: statement
                        .columns
                        .into_iter()
                        .map(|label| WideColumn { label, year: None })
                        .collect(),
                    grid: statement.grid,
                }
            })
            .collect();
        MergedReport { tables }
    }

    /// Serializes to the nested interchange form; duplicate column labels
    /// (overlapping reporting periods not yet normalized away) are
    /// disambiguated with the `" dp_N"` rule.
    pub fn to_nested(&self) -> NestedReport {
        let statements: Vec<Statement> = self.tables.iter().map(WideTable::to_statement).collect();
        workbook_to_nested(&statements)
    }

    pub fn statement_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    /// Row labels per statement, in order — the raw material for a row
    /// selection form.
    pub fn row_choices(&self) -> OrderedMap<Vec<String>> {
        let mut choices = OrderedMap::new();
        for table in &self.tables {
            choices.insert(table.name.clone(), table.rows.clone());
        }
        choices
    }

    pub fn table(&self, name: &str) -> Option<&WideTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Cleans up the joined tables: trims text, zero-fills blanks and
    /// missing cells, reconciles duplicate columns from overlapping
    /// reporting periods, and applies unit-note scaling.
    ///
    /// Pure: returns a new report, leaving `self` untouched.
    pub fn normalize(&self, notes: &UnitNotesByYear) -> MergedReport {
        let mut tables = self.tables.clone();
        for (index, table) in tables.iter_mut().enumerate() {
            trim_text(table);
            zero_fill(table);
            dedup_columns(table);
            scale_units(table, index == 0, notes);
        }
        MergedReport { tables }
    }

    /// Selects rows per statement, in the instruction's order.
    ///
    /// All-or-nothing: every statement must exist and every index must be in
    /// range before any output is produced. The merged report itself is not
    /// modified, so the same report can be filtered repeatedly with different
    /// selections.
    pub fn filter(&self, selection: &FilterInstruction) -> Result<NestedReport> {
        let mut picked: Vec<(&WideTable, &[usize])> = Vec::new();
        for (name, rows) in selection.iter() {
            let table = self.table(name).ok_or_else(|| ReportError::InvalidSelection {
                statement: name.to_string(),
                reason: "statement not present in the merged report".to_string(),
            })?;
            for &row in rows {
                if row >= table.rows.len() {
                    return Err(ReportError::InvalidSelection {
                        statement: name.to_string(),
                        reason: format!(
                            "row index {row} out of range for {} rows",
                            table.rows.len()
                        ),
                    });
                }
            }
            picked.push((table, rows));
        }

        let mut out = NestedReport::new();
        for (table, rows) in picked {
            let mut statement = Statement::new(
                table.name.clone(),
                table.columns.iter().map(|c| c.label.clone()).collect(),
            );
            for &row in rows {
                statement.push_row(table.rows[row].clone(), table.grid[row].clone());
            }
            out.insert(table.name.clone(), statement_to_nested(&statement));
        }
        Ok(out)
    }

    /// True once summary columns have been appended by [`analyze`].
    ///
    /// Detection looks at the first statement analyze touches (the cover
    /// sheet is skipped, so that is the second table).
    pub fn is_analyzed(&self) -> bool {
        self.tables.get(1).is_some_and(|table| {
            table
                .columns
                .iter()
                .any(|c| SUMMARY_COLUMNS.contains(&c.label.as_str()))
        })
    }

    /// Appends min/max/mean summary columns to every statement except the
    /// cover sheet.
    ///
    /// Idempotent: an already-analyzed report is returned unchanged. A row
    /// with no numeric values gets missing aggregates rather than zeros.
    pub fn analyze(&self) -> MergedReport {
        if self.is_analyzed() {
            return self.clone();
        }
        let mut tables = self.tables.clone();
        for table in tables.iter_mut().skip(1) {
            let stats: Vec<Option<(f64, f64, f64)>> =
                table.grid.iter().map(|row| row_stats(row)).collect();
            for label in SUMMARY_COLUMNS {
                table.columns.push(WideColumn {
                    label: label.to_string(),
                    year: None,
                });
            }
            for (row, stat) in table.grid.iter_mut().zip(stats) {
                match stat {
                    Some((min, max, mean)) => {
                        row.push(Cell::Number(min));
                        row.push(Cell::Number(max));
                        row.push(Cell::Number(mean));
                    }
                    None => {
                        row.extend([Cell::Missing, Cell::Missing, Cell::Missing]);
                    }
                }
            }
        }
        MergedReport { tables }
    }
}

/// Min/max/mean over a row's numeric values. Blank text counts as zero (a
/// blank cell is an unreported amount); non-numeric text and missing cells
/// are excluded. `None` when nothing numeric is present.
fn row_stats(row: &[Cell]) -> Option<(f64, f64, f64)> {
    let mut values: Vec<f64> = Vec::with_capacity(row.len());
    for cell in row {
        match cell {
            Cell::Number(n) => values.push(*n),
            Cell::Text(t) if t.trim().is_empty() => values.push(0.0),
            Cell::Text(_) | Cell::Missing => {}
        }
    }
    if values.is_empty() {
        return None;
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Some((min, max, mean))
}

fn trim_text(table: &mut WideTable) {
    for row in table.grid.iter_mut() {
        for cell in row.iter_mut() {
            if let Cell::Text(t) = cell {
                let trimmed = t.trim();
                if trimmed.len() != t.len() {
                    *cell = Cell::Text(trimmed.to_string());
                }
            }
        }
    }
}

fn zero_fill(table: &mut WideTable) {
    for row in table.grid.iter_mut() {
        for cell in row.iter_mut() {
            let blank = match cell {
                Cell::Missing => true,
                Cell::Text(t) => t.is_empty(),
                Cell::Number(_) => false,
            };
            if blank {
                *cell = Cell::Number(0.0);
            }
        }
    }
}

/// Reconciles columns that carry the same reporting period.
///
/// Columns are grouped by label with any `" dp_N"` disambiguation suffix
/// stripped. Within a group the right-most (newest) column is authoritative;
/// its zero cells are backfilled from the nearest older duplicate holding a
/// non-zero value, and the older duplicates are then dropped.
fn dedup_columns(table: &mut WideTable) {
    let canonical: Vec<String> = table
        .columns
        .iter()
        .map(|c| strip_dup_suffix(&c.label).to_string())
        .collect();

    let mut dropped: Vec<usize> = Vec::new();
    let mut grouped: Vec<usize> = Vec::new();
    for i in 0..canonical.len() {
        if grouped.contains(&i) {
            continue;
        }
        let group: Vec<usize> = (i..canonical.len())
            .filter(|&j| canonical[j] == canonical[i])
            .collect();
        grouped.extend(&group);
        if group.len() < 2 {
            continue;
        }

        let keep = *group.last().expect("group is non-empty");
        for r in 0..table.rows.len() {
            if !table.grid[r][keep].is_zero() {
                continue;
            }
            for &older in group[..group.len() - 1].iter().rev() {
                if !table.grid[r][older].is_zero() {
                    table.grid[r][keep] = table.grid[r][older].clone();
                    break;
                }
            }
        }
        table.columns[keep].label = canonical[keep].clone();
        dropped.extend(&group[..group.len() - 1]);
    }

    dropped.sort_unstable();
    for &col in dropped.iter().rev() {
        table.columns.remove(col);
        for row in table.grid.iter_mut() {
            row.remove(col);
        }
    }
}

/// Applies each column's unit-note multiplier, per the year the column came
/// from. Share-count and per-share rows keep their raw values; the cover
/// sheet rescales only its public-float field.
fn scale_units(table: &mut WideTable, is_cover: bool, notes: &UnitNotesByYear) {
    for (c, column) in table.columns.iter().enumerate() {
        let Some(year) = &column.year else { continue };
        let Some(note) = notes.get(year).and_then(|n| n.get(&table.name)) else {
            continue;
        };
        let multiplier = unit_multiplier(note);
        if multiplier == 1.0 {
            continue;
        }
        for (r, label) in table.rows.iter().enumerate() {
            let exempt = if is_cover {
                label != PUBLIC_FLOAT_ROW
            } else {
                is_share_row(label)
            };
            if exempt {
                continue;
            }
            if let Cell::Number(n) = &mut table.grid[r][c] {
                *n *= multiplier;
            }
        }
    }
}
