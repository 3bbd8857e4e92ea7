use std::string::FromUtf8Error;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    /// A sheet in a raw workbook does not have the shape the cleaner expects.
    ///
    /// Raised per statement; the cleaner skips the offending sheet and keeps
    /// going, so callers only see this when an entire workbook is unusable.
    #[error("Malformed statement '{sheet}': {reason}")]
    InputShape { sheet: String, reason: String },

    #[error("No report found for owner '{owner}' named '{name}'")]
    ReportNotFound { owner: String, name: String },

    #[error("No report found with id {0}")]
    ReportIdNotFound(u64),

    #[error("A report named '{name}' already exists for owner '{owner}'")]
    DuplicateReportName { owner: String, name: String },

    #[error("Invalid row selection for statement '{statement}': {reason}")]
    InvalidSelection { statement: String, reason: String },

    #[error("Unsupported output type '{0}': expected 'json' or 'xlsx'")]
    UnsupportedOutputType(String),

    #[error("No fiscal years to merge")]
    EmptyYearSet,

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Resource not found")]
    NotFound,

    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[cfg(feature = "fetch")]
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[cfg(feature = "fetch")]
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("UTF-8 conversion error: {0}")]
    Utf8Error(#[from] FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
