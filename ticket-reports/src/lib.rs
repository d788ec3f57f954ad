//! SQM ticket reports.
//!
//! Pipeline: raw sheet grid → [`table::Table`] (header normalization) →
//! [`select`] (filtering, sorting, lookup join) → [`format`] (HTML text).
//! [`report::ReportService`] ties the stages to a [`sheet_source::SheetSource`]
//! and [`chain`] spreads a full reporting cycle over several invocations.

pub mod chain;
pub mod config;
mod errors;
pub mod format;
pub mod report;
pub mod select;
pub mod table;

pub use chain::{
    ChainOrchestrator, ChainPayload, ChainStrategy, LinkInvoker, LinkOutcome, ReportPublisher,
};
pub use config::{IncidentLayout, RegionGroup, ReportConfig};
pub use errors::{ChainError, ChainResult, ReportConfigError, ReportError, ReportResult};
pub use report::{ReportOutcome, ReportService};
pub use select::extract_incident_ids;
