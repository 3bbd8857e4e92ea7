//! Raw workbook decoding and statement cleaning.
//!
//! EDGAR's `Financial_Report.xlsx` exports are presentation artifacts: merged
//! header cells, bold section headers, a title cell that mixes the statement
//! name with its unit note, and dozens of footnote sheets that are not
//! financial statements at all. This module turns those bytes into the
//! crate's own [`RawWorkbook`](workbook::RawWorkbook) grid model and then
//! into cleaned [`Statement`](crate::Statement) tables ready for conversion
//! and merging.

pub mod cleaner;
pub mod workbook;

pub use cleaner::{CleanedFiling, UnitNotes, clean};
pub use workbook::{MergeRange, RawCell, RawSheet, RawWorkbook};
