//! The report runner: sequences fetch -> clean -> convert -> join, and the
//! later filter/analyze passes, against pluggable collaborators.
//!
//! Two externally visible operations drive the whole system:
//!
//! 1. [`get_row_choices`](ReportRunner::get_row_choices) claims a report name,
//!    builds the joined multi-year report, persists it, and returns the row
//!    labels per statement so a caller can build a selection form.
//! 2. [`create_filtered_report`](ReportRunner::create_filtered_report) applies
//!    the user's row selection to the persisted report and overwrites it with
//!    the filtered result, returning an export copy.
//!
//! A third, [`analyze`](ReportRunner::analyze), appends min/max/mean summary
//! columns to an already-generated report in place.

use crate::convert::{self, OutputType};
use crate::error::{ReportError, Result};
use crate::merge::{FilterInstruction, MergedReport};
use crate::nested::{NestedReport, OrderedMap};
use crate::spreadsheet::{cleaner, workbook::RawWorkbook};
use crate::store::ReportId;
use crate::traits::{FilingSource, ReportStore};
use std::str::FromStr;

/// Row labels per statement, in statement order — the material for a row
/// selection form.
pub type RowChoices = OrderedMap<Vec<String>>;

/// Result of generating a filtered report: the persisted id plus the export
/// copy serialized in the requested output encoding.
#[derive(Debug, Clone)]
pub struct CreatedReport {
    pub id: ReportId,
    pub export: Vec<u8>,
}

/// Orchestrates the report pipeline over a filing source and a report store.
#[derive(Debug, Clone)]
pub struct ReportRunner<S, P> {
    source: S,
    store: P,
}

impl<S: FilingSource, P: ReportStore> ReportRunner<S, P> {
    pub fn new(source: S, store: P) -> Self {
        ReportRunner { source, store }
    }

    /// Builds and persists the joined multi-year report for a company, and
    /// returns the available rows per statement.
    ///
    /// The `(owner, report_name)` pair is claimed exactly once: if it already
    /// exists this fails fast with
    /// [`DuplicateReportName`](ReportError::DuplicateReportName) before any
    /// filing is fetched. The persisted report is joined but not normalized,
    /// so the row indices a user picks from the returned choices address
    /// exactly the table that [`create_filtered_report`] later reconstitutes.
    pub async fn get_row_choices(
        &self,
        owner: &str,
        report_name: &str,
        company_identifier: &str,
        years: &[String],
    ) -> Result<RowChoices> {
        match self.store.load_report(owner, report_name).await {
            Ok(_) => {
                return Err(ReportError::DuplicateReportName {
                    owner: owner.to_string(),
                    name: report_name.to_string(),
                });
            }
            Err(ReportError::ReportNotFound { .. }) => {}
            Err(e) => return Err(e),
        }
        if years.is_empty() {
            return Err(ReportError::EmptyYearSet);
        }

        let mut years: Vec<String> = years.to_vec();
        years.sort();
        years.dedup();

        let workbooks = self
            .source
            .locate_and_fetch(company_identifier, &years)
            .await?;

        let mut per_year: Vec<(String, NestedReport)> = Vec::with_capacity(workbooks.len());
        for year in &years {
            let Some(bytes) = workbooks.get(year) else {
                tracing::warn!(%year, "no filing workbook available; year omitted");
                continue;
            };
            let raw = RawWorkbook::from_xlsx_bytes(bytes)?;
            let cleaned = cleaner::clean(raw)?;
            let nested = convert::workbook_to_nested(&cleaned.statements);
            per_year.push((year.clone(), nested));
        }

        let merged = MergedReport::join(&per_year)?;
        self.store
            .create_report(owner, report_name, &merged.to_nested())
            .await?;
        Ok(merged.row_choices())
    }

    /// Applies a row selection to the previously persisted report and
    /// overwrites it with the filtered result.
    ///
    /// `output_type` (`"json"` or `"xlsx"`) is validated before any other
    /// work and only affects the export copy, never the persisted table.
    pub async fn create_filtered_report(
        &self,
        owner: &str,
        report_name: &str,
        selection: &FilterInstruction,
        output_type: &str,
    ) -> Result<CreatedReport> {
        let output_type = OutputType::from_str(output_type)?;

        let nested = self.store.load_report(owner, report_name).await?;
        let merged = MergedReport::from_nested(&nested);
        let filtered = merged.filter(selection)?;

        let id = self
            .store
            .update_report(owner, report_name, &filtered)
            .await?;
        let export = convert::export(&filtered, output_type)?;
        tracing::debug!(%owner, %report_name, id, "generated filtered report");
        Ok(CreatedReport { id, export })
    }

    /// Appends min/max/mean summary columns to a persisted report.
    ///
    /// No-op (returning the same id) when the report has already been
    /// analyzed.
    pub async fn analyze(&self, report_id: ReportId) -> Result<ReportId> {
        let nested = self.store.load_by_id(report_id).await?;
        let merged = MergedReport::from_nested(&nested);
        let analyzed = merged.analyze();
        self.store
            .update_by_id(report_id, &analyzed.to_nested())
            .await?;
        Ok(report_id)
    }
}
