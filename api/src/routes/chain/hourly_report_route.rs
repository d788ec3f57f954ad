use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response};
use sheet_source::SheetSource;
use telegram_dispatch::ChatTransport;
use ticket_reports::ReportPublisher;
use tracing::{info, instrument};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::AppResult,
    routes::chain::{chain_response::HourlyResponse, preconditions::require_recipients},
};

/// Runs the whole cycle (every region, then the global report) in this
/// request.
#[instrument(name = "hourly_report_route", skip_all)]
pub async fn hourly_report_route<S, T>(
    State(state): State<Arc<AppState<S, T>>>,
) -> AppResult<Response>
where
    S: SheetSource + 'static,
    T: ChatTransport + 'static,
{
    let recipients = require_recipients(&state, "Hourly report").await?;

    let publisher = ReportPublisher::new(&state.reports, &state.dispatcher, recipients);
    let reports_sent = publisher.run_full_cycle().await;
    info!(reports_sent, "hourly report cycle finished");

    Ok(ApiResponse::ok(HourlyResponse {
        message: "Hourly report cycle finished.".to_string(),
        reports_sent,
    })
    .into_response_with_status(StatusCode::OK))
}
