mod common;

use common::read_fixture;
use reportkit::{
    CATEGORY_MARKER, Cell, NestedReport, nested_to_statements, nested_to_xlsx_bytes,
    workbook_to_nested,
};

#[test]
fn fixture_report_round_trips_exactly() {
    let content = read_fixture("reports/2016.json");
    let report: NestedReport = serde_json::from_str(&content).unwrap();

    let statements = nested_to_statements(&report);
    let back = workbook_to_nested(&statements);

    // Serialized forms compare equal byte for byte, so values, nulls, and
    // the year-ordered column layout all survived the round trip.
    assert_eq!(
        serde_json::to_string(&report).unwrap(),
        serde_json::to_string(&back).unwrap()
    );
}

#[test]
fn fixture_statement_axes_keep_document_order() {
    let content = read_fixture("reports/2016.json");
    let report: NestedReport = serde_json::from_str(&content).unwrap();
    let statements = nested_to_statements(&report);

    assert_eq!(statements[0].name, "Document And Entity Information");
    let balance = &statements[2];
    assert_eq!(balance.name, "Consolidated Balance Sheets");
    assert_eq!(
        balance.columns,
        vec!["Nov. 28, 2015", "Nov. 26, 2016"]
    );
    assert_eq!(
        balance.rows,
        vec![
            format!("Current assets{CATEGORY_MARKER}"),
            "Cash and cash equivalents".to_string(),
            "Inventories".to_string(),
            "Short-term investments".to_string()
        ]
    );
    // The category row is structural: null in the document, missing here.
    assert_eq!(*balance.cell(0, 0), Cell::Missing);
    assert_eq!(*balance.cell(1, 0), Cell::Number(36268.0));
}

#[test]
fn fixture_report_exports_to_xlsx() {
    let content = read_fixture("reports/2017.json");
    let report: NestedReport = serde_json::from_str(&content).unwrap();

    let bytes = nested_to_xlsx_bytes(&report).unwrap();
    let book =
        umya_spreadsheet::reader::xlsx::read_reader(std::io::Cursor::new(bytes), true).unwrap();

    assert_eq!(book.get_sheet_count(), 3);
    let cover = book.get_sheet(&0).unwrap();
    assert_eq!(cover.get_value((1, 1)), "Document And Entity Information");
    assert_eq!(cover.get_value((2, 1)), "Nov. 25, 2017 - 12 Months Ended");
    assert_eq!(cover.get_value((1, 2)), "Entity Registrant Name");
    assert_eq!(cover.get_value((2, 2)), "BASSETT FURNITURE INDUSTRIES INC");
}
