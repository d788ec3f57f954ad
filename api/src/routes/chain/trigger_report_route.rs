use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response};
use sheet_source::SheetSource;
use telegram_dispatch::ChatTransport;
use ticket_reports::ChainPayload;
use tracing::{error, info, instrument};

use crate::{
    core::{app_state::AppState, chain_client::TriggerAck, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
    routes::chain::{
        chain_response::TriggerResponse,
        preconditions::{require_chain, require_recipients},
    },
};

/// Starts a reporting cycle by calling the first chain link with every
/// region. Answers `202` once the call is accepted or still running.
#[instrument(name = "trigger_report_route", skip_all)]
pub async fn trigger_report_route<S, T>(
    State(state): State<Arc<AppState<S, T>>>,
) -> AppResult<Response>
where
    S: SheetSource + 'static,
    T: ChatTransport + 'static,
{
    require_recipients(&state, "Report trigger").await?;
    let chain = require_chain(&state, "Report trigger").await?;

    let payload = ChainPayload::full_cycle(state.reports.config());
    info!(regions = ?payload.regions_left, url = %chain.link_url(), "starting reporting cycle");

    match chain.trigger(&payload).await {
        Ok(ack) => Ok(ApiResponse::ok(TriggerResponse {
            message: "Report cycle started.".to_string(),
            regions: payload.regions_left,
            confirmed: ack == TriggerAck::Confirmed,
        })
        .into_response_with_status(StatusCode::ACCEPTED)),
        Err(err) => {
            error!(error = %err, "failed to start reporting cycle");
            state
                .notify_admin(&format!("Bot Error: failed to start report cycle: {err}"))
                .await;
            Err(AppError::Chain(err))
        }
    }
}
