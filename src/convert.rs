//! Conversions between [`Statement`] tables, the nested interchange form,
//! and export formats.
//!
//! Both directions are total over well-formed input: duplicate labels are
//! disambiguated (idempotently) on the way into nested form, numeric values
//! round-trip exactly, and missing cells round-trip as null — never as an
//! empty string or a zero. Zero-filling is a merger policy, not a
//! conversion side effect.

use crate::error::{ReportError, Result};
use crate::nested::{NestedReport, NestedTable, OrderedMap};
use crate::statement::{Cell, Statement};
use std::str::FromStr;

/// Serializes one statement into nested `{column: {row: value}}` form.
///
/// Duplicate row or column labels are suffixed with `" dp_N"` first; the
/// suffixing is a no-op on already-unique labels, so converting twice never
/// stacks suffixes.
pub fn statement_to_nested(statement: &Statement) -> NestedTable {
    let mut stmt = statement.clone();
    stmt.dedup_rows();
    stmt.dedup_columns();

    let mut table = NestedTable::new();
    for (c, column) in stmt.columns.iter().enumerate() {
        let mut by_row = OrderedMap::new();
        for (r, row) in stmt.rows.iter().enumerate() {
            by_row.insert(row.clone(), stmt.grid[r][c].clone());
        }
        table.insert(column.clone(), by_row);
    }
    table
}

/// Reconstructs a statement from nested form (inverse of
/// [`statement_to_nested`]).
///
/// Row order is taken from the first column, with rows that only appear in
/// later columns appended in encounter order; cells absent from a column are
/// [`Cell::Missing`].
pub fn nested_to_statement(name: &str, table: &NestedTable) -> Statement {
    let columns: Vec<String> = table.keys().map(str::to_string).collect();

    let mut rows: Vec<String> = Vec::new();
    for (_, by_row) in table.iter() {
        for row in by_row.keys() {
            if !rows.iter().any(|r| r == row) {
                rows.push(row.to_string());
            }
        }
    }

    let mut statement = Statement::new(name, columns.clone());
    for row in &rows {
        let cells: Vec<Cell> = columns
            .iter()
            .map(|col| {
                table
                    .get(col)
                    .and_then(|by_row| by_row.get(row))
                    .cloned()
                    .unwrap_or(Cell::Missing)
            })
            .collect();
        statement.push_row(row.clone(), cells);
    }
    statement
}

/// Serializes a whole cleaned workbook, statement by statement.
pub fn workbook_to_nested(statements: &[Statement]) -> NestedReport {
    let mut report = NestedReport::new();
    for statement in statements {
        report.insert(statement.name.clone(), statement_to_nested(statement));
    }
    report
}

/// Reconstructs every statement of a nested report, in document order.
pub fn nested_to_statements(report: &NestedReport) -> Vec<Statement> {
    report
        .iter()
        .map(|(name, table)| nested_to_statement(name, table))
        .collect()
}

/// Export encoding for a generated report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    Json,
    Xlsx,
}

impl FromStr for OutputType {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(OutputType::Json),
            "xlsx" => Ok(OutputType::Xlsx),
            other => Err(ReportError::UnsupportedOutputType(other.to_string())),
        }
    }
}

/// Serializes a nested report for export in the requested encoding.
pub fn export(report: &NestedReport, output_type: OutputType) -> Result<Vec<u8>> {
    match output_type {
        OutputType::Json => Ok(serde_json::to_vec(report)?),
        OutputType::Xlsx => nested_to_xlsx_bytes(report),
    }
}

// Excel caps sheet names at 31 characters; long statement names are truncated
// and disambiguated with a numeric suffix.
fn sheet_title(name: &str, taken: &mut Vec<String>) -> String {
    let short: String = name.chars().take(31).collect();
    let count = taken.iter().filter(|t| **t == short).count();
    taken.push(short.clone());
    if count == 0 {
        short
    } else {
        let stem: String = name.chars().take(29).collect();
        format!("{}_{}", stem, count + 1)
    }
}

/// Writes a nested report as an xlsx workbook, one sheet per statement.
///
/// The full statement name goes into `A1` (sheet titles may be truncated),
/// column labels into the rest of row 1, and each subsequent row carries its
/// label in column A. Missing cells are left blank.
pub fn nested_to_xlsx_bytes(report: &NestedReport) -> Result<Vec<u8>> {
    let mut book = umya_spreadsheet::new_file();
    let _ = book.remove_sheet_by_name("Sheet1");

    let mut taken: Vec<String> = Vec::new();
    for (name, table) in report.iter() {
        let statement = nested_to_statement(name, table);
        let title = sheet_title(name, &mut taken);
        let sheet = book
            .new_sheet(&title)
            .map_err(|e| ReportError::Spreadsheet(e.to_string()))?;

        sheet.get_cell_mut((1, 1)).set_value(name);
        for (c, column) in statement.columns.iter().enumerate() {
            sheet
                .get_cell_mut((c as u32 + 2, 1))
                .set_value(column.as_str());
        }
        for (r, row) in statement.rows.iter().enumerate() {
            sheet.get_cell_mut((1, r as u32 + 2)).set_value(row.as_str());
            for (c, cell) in statement.grid[r].iter().enumerate() {
                let coord = (c as u32 + 2, r as u32 + 2);
                match cell {
                    Cell::Number(n) => {
                        sheet.get_cell_mut(coord).set_value_number(*n);
                    }
                    Cell::Text(s) => {
                        sheet.get_cell_mut(coord).set_value(s.as_str());
                    }
                    Cell::Missing => {}
                }
            }
        }
    }

    let mut out: Vec<u8> = Vec::new();
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut out)
        .map_err(|e| ReportError::Spreadsheet(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_statement() -> Statement {
        let mut stmt = Statement::new(
            "Consolidated Balance Sheets",
            vec!["Dec. 31, 2016".to_string(), "Dec. 31, 2017".to_string()],
        );
        stmt.push_row(
            "Assets - CATEGORY",
            vec![Cell::Missing, Cell::Missing],
        );
        stmt.push_row(
            "Cash and cash equivalents",
            vec![Cell::Number(1200.0), Cell::Number(1500.0)],
        );
        stmt.push_row(
            "Goodwill",
            vec![Cell::Missing, Cell::Number(300.0)],
        );
        stmt
    }

    #[test]
    fn round_trip_preserves_cells_and_order() {
        let stmt = sample_statement();
        let nested = statement_to_nested(&stmt);
        let back = nested_to_statement(&stmt.name, &nested);
        assert_eq!(back, stmt);
    }

    #[test]
    fn duplicate_rows_suffixed_once() {
        let mut stmt = Statement::new("Income", vec!["Q4".to_string()]);
        stmt.push_row("Revenue", vec![Cell::Number(1.0)]);
        stmt.push_row("Revenue", vec![Cell::Number(2.0)]);

        let nested = statement_to_nested(&stmt);
        let column = nested.get("Q4").unwrap();
        let rows: Vec<&str> = column.keys().collect();
        assert_eq!(rows, vec!["Revenue", "Revenue dp_1"]);

        // A second conversion pass must not stack suffixes.
        let again = statement_to_nested(&nested_to_statement("Income", &nested));
        let rows: Vec<&str> = again.get("Q4").unwrap().keys().collect();
        assert_eq!(rows, vec!["Revenue", "Revenue dp_1"]);
    }

    #[test]
    fn missing_cells_stay_null_not_zero() {
        let nested = statement_to_nested(&sample_statement());
        let cell = nested
            .get("Dec. 31, 2016")
            .and_then(|c| c.get("Goodwill"))
            .unwrap();
        assert_eq!(*cell, Cell::Missing);
        let json = serde_json::to_string(&nested).unwrap();
        assert!(json.contains(r#""Goodwill":null"#));
    }

    #[test]
    fn output_type_parses_and_rejects() {
        assert_eq!(OutputType::from_str("json").unwrap(), OutputType::Json);
        assert_eq!(OutputType::from_str("xlsx").unwrap(), OutputType::Xlsx);
        assert!(matches!(
            OutputType::from_str("csv"),
            Err(ReportError::UnsupportedOutputType(t)) if t == "csv"
        ));
    }

    #[test]
    fn sheet_titles_truncate_and_disambiguate() {
        let mut taken = Vec::new();
        let long = "Consolidated Statements Of Comprehensive Income";
        let first = sheet_title(long, &mut taken);
        let second = sheet_title(long, &mut taken);
        assert_eq!(first.chars().count(), 31);
        assert_ne!(first, second);
        assert!(second.ends_with("_2"));
    }

    #[test]
    fn xlsx_export_round_trips_through_the_reader() {
        let stmt = sample_statement();
        let report = workbook_to_nested(&[stmt]);
        let bytes = nested_to_xlsx_bytes(&report).unwrap();

        let book = umya_spreadsheet::reader::xlsx::read_reader(
            std::io::Cursor::new(bytes),
            true,
        )
        .unwrap();
        let sheet = book.get_sheet(&0).unwrap();
        assert_eq!(sheet.get_value((1, 1)), "Consolidated Balance Sheets");
        assert_eq!(sheet.get_value((2, 1)), "Dec. 31, 2016");
        assert_eq!(sheet.get_value((2, 3)), "1200");
    }
}
