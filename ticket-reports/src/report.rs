//! Report generation entry points.
//!
//! [`ReportService`] fetches sheets through a [`SheetSource`], runs selection
//! and formatting, and turns every failure into [`ReportOutcome::Failed`] so
//! callers always have text to send.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sheet_source::SheetSource;
use tracing::{error, info, warn};

use crate::{
    config::{IncidentLayout, RegionGroup, ReportConfig},
    errors::ReportResult,
    format::{
        format_ccan_report, format_regional_report, incident_detail, incident_not_found,
        incident_summary_line, join_incident_replies,
    },
    select::{
        enrich_incident, find_incident, index_by_incident, select_global_ccan,
        select_regional_sqm,
    },
    table::{Table, TicketRow},
};

/// Result of one report generation; both arms carry user-visible text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Generated(String),
    Failed(String),
}

impl ReportOutcome {
    pub fn text(&self) -> &str {
        match self {
            ReportOutcome::Generated(text) | ReportOutcome::Failed(text) => text,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, ReportOutcome::Generated(_))
    }
}

/// Builds reports from fresh sheet data on every call.
#[derive(Debug, Clone)]
pub struct ReportService<S> {
    source: S,
    config: ReportConfig,
}

impl<S: SheetSource> ReportService<S> {
    pub fn new(source: S, config: ReportConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.config.timezone)
    }

    async fn load(&self, sheet: &str) -> ReportResult<Table> {
        let grid = self.source.fetch_grid(sheet).await?;
        Ok(Table::from_grid(grid))
    }

    /// Regional SQM report for one region group.
    pub async fn regional_report(&self, group: &RegionGroup) -> ReportOutcome {
        self.regional_report_at(group, self.now()).await
    }

    pub async fn regional_report_at(&self, group: &RegionGroup, at: DateTime<Tz>) -> ReportOutcome {
        match self.build_regional(group, &at).await {
            Ok(text) => ReportOutcome::Generated(text),
            Err(err) => {
                error!(region = %group.name, error = %err, "regional SQM report failed");
                ReportOutcome::Failed(format!(
                    "Bot Error: Exception in SQM report for {}.",
                    group.name
                ))
            }
        }
    }

    async fn build_regional(&self, group: &RegionGroup, at: &DateTime<Tz>) -> ReportResult<String> {
        let tickets = self.load(&self.config.tickets_sheet).await?;
        let selected = select_regional_sqm(&tickets, &group.sektor_labels, self.config.age_threshold)?;
        info!(region = %group.name, rows = selected.len(), "regional SQM report built");
        Ok(format_regional_report(&group.name, &selected, at))
    }

    /// Global SQM(CCAN) report across all regions.
    pub async fn ccan_report(&self) -> ReportOutcome {
        self.ccan_report_at(self.now()).await
    }

    pub async fn ccan_report_at(&self, at: DateTime<Tz>) -> ReportOutcome {
        match self.build_ccan(&at).await {
            Ok(text) => ReportOutcome::Generated(text),
            Err(err) => {
                error!(error = %err, "global CCAN report failed");
                ReportOutcome::Failed("Bot Error: Exception in SQM(CCAN) report.".to_string())
            }
        }
    }

    async fn build_ccan(&self, at: &DateTime<Tz>) -> ReportResult<String> {
        let tickets = self.load(&self.config.tickets_sheet).await?;
        let lookup = self.load(&self.config.lookup_sheet).await?;
        let selected = select_global_ccan(&tickets, &lookup)?;
        info!(rows = selected.len(), "global CCAN report built");
        Ok(format_ccan_report(&selected, at))
    }

    /// Looks up each incident id and renders one reply per id, in the given
    /// order. Missing incidents get a not-found line.
    pub async fn incident_lookup(&self, incident_ids: &[String]) -> ReportOutcome {
        match self.build_incident_replies(incident_ids).await {
            Ok(text) => ReportOutcome::Generated(text),
            Err(err) => {
                error!(error = %err, ids = incident_ids.len(), "incident lookup failed");
                ReportOutcome::Failed("Bot Error: Exception in incident lookup.".to_string())
            }
        }
    }

    async fn build_incident_replies(&self, incident_ids: &[String]) -> ReportResult<String> {
        let tickets = self.load(&self.config.tickets_sheet).await?;

        // Enrichment is optional: a missing or broken lookup sheet only
        // removes summary/segment from the replies.
        let lookup = match self.load(&self.config.lookup_sheet).await {
            Ok(table) => Some(table),
            Err(err) => {
                warn!(error = %err, "lookup sheet unavailable; replying without enrichment");
                None
            }
        };
        let index: Option<HashMap<String, &TicketRow>> = lookup.as_ref().map(index_by_incident);

        let mut replies = Vec::with_capacity(incident_ids.len());
        for id in incident_ids {
            let reply = match find_incident(&tickets, id)? {
                Some(row) => {
                    let enriched = enrich_incident(row, index.as_ref());
                    match self.config.incident_layout {
                        IncidentLayout::Detail => incident_detail(&enriched),
                        IncidentLayout::Summary => incident_summary_line(&enriched),
                    }
                }
                None => incident_not_found(id, &self.config.tickets_sheet),
            };
            replies.push(reply);
        }

        Ok(join_incident_replies(&replies))
    }
}
