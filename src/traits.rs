//! Trait definitions for the orchestrator's collaborators.
//!
//! The report pipeline itself is pure, synchronous computation over in-memory
//! tables; everything with I/O behind it sits on the other side of one of
//! these seams. The [`ReportRunner`](crate::ReportRunner) is generic over
//! both traits, which keeps the pipeline testable with in-memory fakes and
//! lets deployments swap the EDGAR-backed source or the persistence backend
//! without touching the merge logic.

use crate::error::Result;
use crate::nested::NestedReport;
use crate::store::ReportId;
use async_trait::async_trait;
use std::collections::HashMap;

/// Locates and downloads filing workbooks for a company.
///
/// Implementations resolve a company identifier (a CIK on EDGAR) and a list
/// of fiscal years to raw spreadsheet bytes, one workbook per year. A year
/// with no available filing is simply omitted from the result — "not found"
/// is an expected outcome, and only transport failures are errors.
#[async_trait]
pub trait FilingSource {
    /// Returns raw workbook bytes keyed by fiscal year label.
    async fn locate_and_fetch(
        &self,
        company_identifier: &str,
        years: &[String],
    ) -> Result<HashMap<String, Vec<u8>>>;
}

/// Key-value persistence for merged reports, keyed by `(owner, name)`.
///
/// The store is the only shared resource in the pipeline. Name claiming is
/// serialized by the store's own uniqueness constraint on creation — two
/// concurrent claims for the same `(owner, name)` must not both succeed —
/// rather than by locking in the pipeline.
#[async_trait]
pub trait ReportStore {
    /// Persists a new report. Fails with
    /// [`DuplicateReportName`](crate::ReportError::DuplicateReportName) when
    /// the `(owner, name)` pair is already claimed.
    async fn create_report(
        &self,
        owner: &str,
        name: &str,
        report: &NestedReport,
    ) -> Result<ReportId>;

    /// Replaces an existing report's content, keeping its id.
    async fn update_report(
        &self,
        owner: &str,
        name: &str,
        report: &NestedReport,
    ) -> Result<ReportId>;

    /// Loads a report by owner and name.
    async fn load_report(&self, owner: &str, name: &str) -> Result<NestedReport>;

    /// Loads a report by its id.
    async fn load_by_id(&self, id: ReportId) -> Result<NestedReport>;

    /// Replaces a report's content by its id.
    async fn update_by_id(&self, id: ReportId, report: &NestedReport) -> Result<()>;
}
