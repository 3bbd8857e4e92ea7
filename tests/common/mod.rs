use reportkit::{FilingSource, ReportError, Result};
use std::collections::HashMap;
use std::{
    fs,
    path::{Path, PathBuf},
};

#[allow(dead_code)]
pub fn fixture_path(relative: impl AsRef<Path>) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative)
}

#[allow(dead_code)]
pub fn read_fixture(relative: impl AsRef<Path>) -> String {
    fs::read_to_string(fixture_path(relative)).expect("fixture file should be readable")
}

/// Builds a small filing workbook the way EDGAR's `Financial_Report.xlsx`
/// exports look before cleaning: a cover sheet, one income statement with a
/// merged "12 Months Ended" header and a bold category row, and a footnote
/// sheet that the cleaner must drop.
#[allow(dead_code)]
pub fn build_filing_xlsx(year: u32, revenue: f64, shares: f64) -> Vec<u8> {
    let mut book = umya_spreadsheet::new_file();

    let cover = book.get_sheet_by_name_mut("Sheet1").expect("default sheet");
    cover.set_name("Document And Entity Information");
    cover
        .get_cell_mut((1, 1))
        .set_value("Document And Entity Information - USD ($)");
    cover.get_cell_mut((2, 1)).set_value(format!("Dec. 31, {year}"));
    cover.get_cell_mut((1, 2)).set_value("Entity Registrant Name");
    cover.get_cell_mut((2, 2)).set_value("ACME HOLDINGS INC");
    cover.get_cell_mut((1, 3)).set_value("Entity Public Float");
    cover.get_cell_mut((2, 3)).set_value_number(350.0);

    let income = book
        .new_sheet("Consolidated Statements Of Income")
        .expect("fresh sheet name");
    income
        .get_cell_mut((1, 1))
        .set_value("Consolidated Statements Of Income - USD ($) $ in Thousands");
    income.get_cell_mut((2, 1)).set_value("12 Months Ended");
    income.add_merge_cells("B1:C1");
    income.get_cell_mut((2, 2)).set_value(format!("Dec. 31, {}", year - 1));
    income.get_cell_mut((3, 2)).set_value(format!("Dec. 31, {year}"));

    income.get_cell_mut((1, 3)).set_value("Revenues:");
    income
        .get_cell_mut((1, 3))
        .get_style_mut()
        .get_font_mut()
        .set_bold(true);
    income.get_cell_mut((1, 4)).set_value("Revenue");
    income.get_cell_mut((2, 4)).set_value_number(revenue * 0.9);
    income.get_cell_mut((3, 4)).set_value_number(revenue);
    income
        .get_cell_mut((1, 5))
        .set_value("Shares Outstanding (in shares)");
    income.get_cell_mut((2, 5)).set_value_number(shares);
    income.get_cell_mut((3, 5)).set_value_number(shares);

    let footnote = book
        .new_sheet("Summary Of Significant Accounting Policies")
        .expect("fresh sheet name");
    footnote
        .get_cell_mut((1, 1))
        .set_value("Summary Of Significant Accounting Policies - USD ($)");
    footnote.get_cell_mut((1, 2)).set_value("Narrative text");

    let mut out: Vec<u8> = Vec::new();
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut out)
        .expect("workbook should serialize");
    out
}

/// Filing source fake: serves pre-built workbook bytes by year.
#[allow(dead_code)]
#[derive(Default, Clone)]
pub struct MockFilingSource {
    workbooks: HashMap<String, Vec<u8>>,
    fail_transport: bool,
}

#[allow(dead_code)]
impl MockFilingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workbook(mut self, year: &str, bytes: Vec<u8>) -> Self {
        self.workbooks.insert(year.to_string(), bytes);
        self
    }

    pub fn failing() -> Self {
        MockFilingSource {
            fail_transport: true,
            ..Self::default()
        }
    }
}

#[async_trait::async_trait]
impl FilingSource for MockFilingSource {
    async fn locate_and_fetch(
        &self,
        _company_identifier: &str,
        years: &[String],
    ) -> Result<HashMap<String, Vec<u8>>> {
        if self.fail_transport {
            return Err(ReportError::FileError(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "transport failure",
            )));
        }
        Ok(self
            .workbooks
            .iter()
            .filter(|(year, _)| years.contains(year))
            .map(|(year, bytes)| (year.clone(), bytes.clone()))
            .collect())
    }
}
