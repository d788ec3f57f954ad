//! Crate-wide error hierarchy for ticket-reports.

use sheet_source::SheetError;
use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type ReportResult<T> = Result<T, ReportError>;

/// Errors raised while building a report. They never escape a report
/// generation call; [`crate::report::ReportService`] turns them into
/// [`crate::report::ReportOutcome::Failed`].
#[derive(Debug, Error)]
pub enum ReportError {
    /// The sheet has a header row but lacks a column the report needs.
    #[error("column `{0}` not found in sheet")]
    MissingColumn(String),

    /// Fetching a sheet failed.
    #[error(transparent)]
    Sheet(#[from] SheetError),
}

/// Invalid static report configuration, raised by [`crate::config::ReportConfig::new`].
#[derive(Debug, Error)]
pub enum ReportConfigError {
    #[error("duplicate region name: {0}")]
    DuplicateRegion(String),

    #[error("region `{0}` has no sektor labels")]
    EmptyRegion(String),

    #[error("age threshold must be a finite number")]
    InvalidThreshold,
}

/// Convenient alias for chain-invocation results.
pub type ChainResult<T> = Result<T, ChainError>;

/// Failure to hand the remaining work-list to the next chain link.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The next link did not answer in time.
    #[error("next link timed out")]
    Timeout,

    /// The next link endpoint answered with a non-success status.
    #[error("next link rejected with status {0}")]
    Rejected(u16),

    /// Network/transport failure while calling the next link.
    #[error("network error: {0}")]
    Network(String),
}
