//! # ReportKit - merge multi-year EDGAR financial reports
//!
//! ReportKit pulls a company's periodic filings (10-K/10-Q) from the SEC
//! EDGAR system, cleans each year's `Financial_Report.xlsx` workbook into
//! per-statement tables, merges the years into one wide table per statement,
//! and lets a user filter the merged report down to the rows they care about
//! and persist the result.
//!
//! ## Features
//!
//! - **Spreadsheet cleaning** - Strips footnote sheets, flattens merged
//!   period headers, tags bold category rows, and splits unit notes out of
//!   statement titles
//! - **Multi-year merging** - Concatenates per-year statement columns in year
//!   order, unions row labels, and reconciles restated overlapping periods
//! - **Normalization** - Explicit zero-filling, duplicate-column
//!   reconciliation, and unit-note scaling (thousands/millions/billions)
//! - **Filtering & analysis** - User-ordered row selection and min/max/mean
//!   summary columns
//! - **Rate-limited EDGAR fetch** (feature `fetch`, default) - Complies with
//!   SEC.gov fair access rules while locating and downloading workbooks
//!
//! ## Basic Usage
//!
//! ```ignore
//! use reportkit::{EdgarClient, EdgarFilingSource, MemoryStore, ReportRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Initialize with a proper user agent (required by SEC.gov)
//!     let client = EdgarClient::new("YourAppName contact@example.com")?;
//!     let runner = ReportRunner::new(EdgarFilingSource::new(client), MemoryStore::new());
//!
//!     let years = vec!["2016".to_string(), "2017".to_string()];
//!     let choices = runner
//!         .get_row_choices("analyst", "bassett-fy", "10329", &years)
//!         .await?;
//!
//!     for (statement, rows) in choices.iter() {
//!         println!("{statement}: {} rows available", rows.len());
//!     }
//!     Ok(())
//! }
//! ```

mod convert;
mod error;
mod merge;
mod nested;
mod runner;
mod statement;
mod store;
mod traits;

pub mod spreadsheet;

// EDGAR fetch stack (optional)
#[cfg(feature = "fetch")]
mod client;
#[cfg(feature = "fetch")]
mod config;
#[cfg(feature = "fetch")]
mod locator;

// Core types
pub use error::{ReportError, Result};
pub use nested::{NestedReport, NestedTable, OrderedMap};
pub use statement::{CATEGORY_MARKER, Cell, Statement, is_share_row, unit_multiplier};

// Pipeline stages
pub use convert::{
    OutputType, export, nested_to_statement, nested_to_statements, nested_to_xlsx_bytes,
    statement_to_nested, workbook_to_nested,
};
pub use merge::{FilterInstruction, MergedReport, UnitNotesByYear, WideColumn, WideTable};
pub use runner::{CreatedReport, ReportRunner, RowChoices};
pub use spreadsheet::{CleanedFiling, UnitNotes, clean};

// Collaborator seams and implementations
pub use store::{FileStore, MemoryStore, ReportId};
pub use traits::{FilingSource, ReportStore};

// EDGAR fetch stack
#[cfg(feature = "fetch")]
pub use client::EdgarClient;
#[cfg(feature = "fetch")]
pub use config::{ClientConfig, EdgarUrls};
#[cfg(feature = "fetch")]
pub use locator::{EdgarFilingSource, RecentFilings, Submission};

/// Current crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
