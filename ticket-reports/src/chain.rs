//! Chained reporting cycle.
//!
//! One reporting cycle is one regional report per region group followed by
//! the global CCAN report. A single invocation may not have enough execution
//! time for all of it, so the cycle is split into links: each link publishes
//! one region and hands the rest of the work-list to the next invocation.
//!
//! Delivery is at-least-once per region: re-delivering a payload re-sends
//! that region's report.

use std::{future::Future, str::FromStr};

use serde::{Deserialize, Serialize};
use sheet_source::SheetSource;
use telegram_dispatch::{ChatTransport, ChunkedDispatcher};
use tracing::{error, info, warn};

use crate::{config::ReportConfig, errors::ChainResult, report::ReportService};

/// Work-list carried between links: `{"regions_left": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainPayload {
    pub regions_left: Vec<String>,
}

impl ChainPayload {
    /// Payload for a complete cycle, in configured order.
    pub fn full_cycle(config: &ReportConfig) -> Self {
        Self {
            regions_left: config.region_names(),
        }
    }

    fn pop_front(&mut self) -> Option<String> {
        if self.regions_left.is_empty() {
            None
        } else {
            Some(self.regions_left.remove(0))
        }
    }
}

/// Issues the next link with the remaining work-list.
pub trait LinkInvoker: Clone + Send + Sync + 'static {
    fn invoke(&self, payload: ChainPayload) -> impl Future<Output = ChainResult<()>> + Send;
}

/// How the next link is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainStrategy {
    /// Spawn the call and return immediately. The task is unsupervised: a
    /// failure is logged and the cycle stops there.
    #[default]
    Detached,
    /// Await the call, holding the current invocation until the next link
    /// answers.
    Inline,
}

impl FromStr for ChainStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "detached" | "async" => Ok(ChainStrategy::Detached),
            "inline" | "sync" => Ok(ChainStrategy::Inline),
            other => Err(format!("unknown chain mode `{other}`")),
        }
    }
}

/// What one link did after publishing its region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The remainder was handed to the next link.
    Handed {
        region: Option<String>,
        next: ChainPayload,
    },
    /// The work-list was empty; the global report was published.
    Completed { region: Option<String> },
    /// Handing off failed; the remainder is lost.
    Stalled {
        region: Option<String>,
        lost: ChainPayload,
    },
}

/// Generates reports and delivers them to every recipient.
pub struct ReportPublisher<'a, S, T> {
    reports: &'a ReportService<S>,
    dispatcher: &'a ChunkedDispatcher<T>,
    recipients: &'a [i64],
}

impl<'a, S: SheetSource, T: ChatTransport> ReportPublisher<'a, S, T> {
    pub fn new(
        reports: &'a ReportService<S>,
        dispatcher: &'a ChunkedDispatcher<T>,
        recipients: &'a [i64],
    ) -> Self {
        Self {
            reports,
            dispatcher,
            recipients,
        }
    }

    /// Publishes the regional report for `region`. Unknown names are logged
    /// and skipped; returns whether a report was sent.
    pub async fn publish_region(&self, region: &str) -> bool {
        let Some(group) = self.reports.config().region(region) else {
            warn!(region, "unknown region in work-list; skipping");
            return false;
        };

        let outcome = self.reports.regional_report(group).await;
        self.dispatcher
            .deliver_to_all(self.recipients, outcome.text())
            .await;
        info!(region = %group.name, generated = outcome.is_generated(), "regional report published");
        true
    }

    /// Publishes the global CCAN report.
    pub async fn publish_global(&self) {
        let outcome = self.reports.ccan_report().await;
        self.dispatcher
            .deliver_to_all(self.recipients, outcome.text())
            .await;
        info!(generated = outcome.is_generated(), "global report published");
    }

    /// Whole cycle in one invocation; returns the number of reports sent.
    pub async fn run_full_cycle(&self) -> usize {
        let mut published = 0;
        for group in self.reports.config().region_groups() {
            if self.publish_region(&group.name).await {
                published += 1;
            }
        }
        self.publish_global().await;
        published + 1
    }
}

/// Runs one link of the cycle.
pub struct ChainOrchestrator<'a, S, T, L> {
    publisher: ReportPublisher<'a, S, T>,
    invoker: L,
    strategy: ChainStrategy,
}

impl<'a, S, T, L> ChainOrchestrator<'a, S, T, L>
where
    S: SheetSource,
    T: ChatTransport,
    L: LinkInvoker,
{
    pub fn new(publisher: ReportPublisher<'a, S, T>, invoker: L, strategy: ChainStrategy) -> Self {
        Self {
            publisher,
            invoker,
            strategy,
        }
    }

    /// Pops the head region, publishes it, then either hands the remainder to
    /// the next link or, when nothing is left, publishes the global report.
    pub async fn run_link(&self, mut payload: ChainPayload) -> LinkOutcome {
        let region = payload.pop_front();
        info!(
            region = region.as_deref().unwrap_or("-"),
            remaining = payload.regions_left.len(),
            "chain link started"
        );

        if let Some(name) = &region {
            self.publisher.publish_region(name).await;
        }

        if payload.regions_left.is_empty() {
            self.publisher.publish_global().await;
            info!("reporting cycle complete");
            return LinkOutcome::Completed { region };
        }

        match self.hand_off(payload.clone()).await {
            Ok(()) => LinkOutcome::Handed {
                region,
                next: payload,
            },
            Err(err) => {
                error!(
                    error = %err,
                    regions_left = ?payload.regions_left,
                    "next chain link failed; cycle stalled"
                );
                LinkOutcome::Stalled {
                    region,
                    lost: payload,
                }
            }
        }
    }

    async fn hand_off(&self, next: ChainPayload) -> ChainResult<()> {
        match self.strategy {
            ChainStrategy::Inline => self.invoker.invoke(next).await,
            ChainStrategy::Detached => {
                let invoker = self.invoker.clone();
                tokio::spawn(async move {
                    let regions_left = next.regions_left.clone();
                    if let Err(err) = invoker.invoke(next).await {
                        error!(
                            error = %err,
                            ?regions_left,
                            "detached chain link failed; cycle stalled"
                        );
                    }
                });
                Ok(())
            }
        }
    }
}
