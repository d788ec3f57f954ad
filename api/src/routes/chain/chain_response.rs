use serde::Serialize;
use ticket_reports::ChainPayload;

/// Body returned by `trigger_report`.
#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub message: String,
    pub regions: Vec<String>,
    /// False when the first link was still running at the trigger timeout.
    pub confirmed: bool,
}

/// Body returned by `chain_link` once the link has been taken over by a
/// background task.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct LinkAccepted {
    /// Region this link publishes; `None` means only the global report.
    pub region: Option<String>,
    /// Regions handed to the following links.
    pub regions_next: Vec<String>,
}

impl From<&ChainPayload> for LinkAccepted {
    fn from(payload: &ChainPayload) -> Self {
        let mut regions = payload.regions_left.iter().cloned();
        Self {
            region: regions.next(),
            regions_next: regions.collect(),
        }
    }
}

/// Body returned by `hourly_report`.
#[derive(Debug, Serialize)]
pub struct HourlyResponse {
    pub message: String,
    pub reports_sent: usize,
}
