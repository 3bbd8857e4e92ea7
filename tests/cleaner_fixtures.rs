mod common;

use common::build_filing_xlsx;
use reportkit::spreadsheet::{RawWorkbook, clean};
use reportkit::{CATEGORY_MARKER, Cell};

#[test]
fn decodes_values_bold_flags_and_merges() {
    let bytes = build_filing_xlsx(2017, 452501.0, 10_714_000.0);
    let raw = RawWorkbook::from_xlsx_bytes(&bytes).unwrap();

    assert_eq!(raw.sheets.len(), 3);
    assert_eq!(raw.sheets[0].name, "Document And Entity Information");
    assert_eq!(raw.sheets[1].name, "Consolidated Statements Of Income");

    let income = &raw.sheets[1];
    assert_eq!(income.value(0, 1), Some("12 Months Ended"));
    assert_eq!(income.merges.len(), 1);
    assert!(income.merges[0].is_horizontal());

    // "Revenues:" is bold in the label column; nothing else is.
    assert!(income.cell(2, 0).unwrap().bold);
    assert!(!income.cell(3, 0).unwrap().bold);
}

#[test]
fn cleans_a_real_workbook_end_to_end() {
    let bytes = build_filing_xlsx(2017, 452501.0, 10_714_000.0);
    let raw = RawWorkbook::from_xlsx_bytes(&bytes).unwrap();
    let cleaned = clean(raw).unwrap();

    let names: Vec<&str> = cleaned.statements.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Document And Entity Information",
            "Consolidated Statements Of Income"
        ]
    );

    let income = &cleaned.statements[1];
    assert_eq!(
        income.columns,
        vec![
            "Dec. 31, 2016 - 12 Months Ended",
            "Dec. 31, 2017 - 12 Months Ended"
        ]
    );
    assert_eq!(
        income.rows,
        vec![
            format!("Revenues:{CATEGORY_MARKER}"),
            "Revenue".to_string(),
            "Shares Outstanding (in shares)".to_string()
        ]
    );
    assert_eq!(*income.cell(1, 1), Cell::Number(452501.0));
    // The category row has no reported figures.
    assert_eq!(*income.cell(0, 0), Cell::Missing);

    assert_eq!(
        cleaned.notes.get("Consolidated Statements Of Income").unwrap(),
        "USD ($) $ in Thousands"
    );
    assert_eq!(
        cleaned.notes.get("Document And Entity Information").unwrap(),
        "USD ($)"
    );
}

#[test]
fn cover_sheet_keeps_identifier_rows() {
    let bytes = build_filing_xlsx(2016, 420023.0, 10_714_000.0);
    let raw = RawWorkbook::from_xlsx_bytes(&bytes).unwrap();
    let cleaned = clean(raw).unwrap();

    let cover = &cleaned.statements[0];
    assert_eq!(cover.columns, vec!["Dec. 31, 2016"]);
    assert_eq!(cover.rows, vec!["Entity Registrant Name", "Entity Public Float"]);
    assert_eq!(*cover.cell(0, 0), Cell::Text("ACME HOLDINGS INC".to_string()));
    assert_eq!(*cover.cell(1, 0), Cell::Number(350.0));
}
