use std::sync::Arc;

use axum::{
    extract::{Json, State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};
use sheet_source::SheetSource;
use telegram_dispatch::ChatTransport;
use ticket_reports::{ChainOrchestrator, ChainPayload, LinkOutcome, ReportPublisher};
use tracing::{Instrument, error, info, info_span, instrument};

use crate::{
    core::{app_state::AppState, chain_client::ChainClient, http::response_envelope::ApiResponse},
    error_handler::AppResult,
    routes::chain::{
        chain_response::LinkAccepted,
        preconditions::{require_chain, require_recipients},
    },
};

/// One link of the chained cycle. Answers `202` right away and publishes the
/// head region in a background task, so a caller that stops waiting (the
/// trigger's short timeout) does not cancel the link.
#[instrument(name = "chain_link_route", skip_all)]
pub async fn chain_link_route<S, T>(
    State(state): State<Arc<AppState<S, T>>>,
    body: Result<Json<ChainPayload>, JsonRejection>,
) -> AppResult<Response>
where
    S: SheetSource + 'static,
    T: ChatTransport + 'static,
{
    let Json(payload) = body?;
    require_recipients(&state, "Chain link").await?;
    let chain = require_chain(&state, "Chain link").await?.clone();

    let accepted = LinkAccepted::from(&payload);
    let span = info_span!("chain_link_task", region = accepted.region.as_deref().unwrap_or("-"));
    tokio::spawn(run_link(Arc::clone(&state), chain, payload).instrument(span));

    Ok(ApiResponse::ok(accepted).into_response_with_status(StatusCode::ACCEPTED))
}

async fn run_link<S: SheetSource, T: ChatTransport>(
    state: Arc<AppState<S, T>>,
    chain: ChainClient,
    payload: ChainPayload,
) {
    let orchestrator = ChainOrchestrator::new(
        ReportPublisher::new(&state.reports, &state.dispatcher, &state.config.recipients),
        chain,
        state.config.chain.strategy,
    );

    match orchestrator.run_link(payload).await {
        LinkOutcome::Stalled { region, lost } => {
            error!(region = ?region, lost = ?lost.regions_left, "chain link stalled");
            state
                .notify_admin(&format!(
                    "Bot Error: report chain stopped; regions not sent: {}",
                    lost.regions_left.join(", ")
                ))
                .await;
        }
        outcome => info!(?outcome, "chain link finished"),
    }
}
