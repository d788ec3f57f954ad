use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use sheet_source::SheetSource;
use telegram_dispatch::ChatTransport;
use tracing::{debug, error, instrument};

use crate::{
    core::app_state::AppState,
    routes::webhook::{
        telegram_update::TelegramUpdate,
        update_handler::{BotContext, UpdateDisposition},
    },
};

/// Telegram webhook. Always answers `200 {"status":"ok"}` so Telegram does
/// not redeliver; failures are logged and mirrored to the admin chat.
#[instrument(name = "webhook_route", skip_all, fields(bytes = body.len()))]
pub async fn webhook_route<S, T>(State(state): State<Arc<AppState<S, T>>>, body: Bytes) -> Response
where
    S: SheetSource + 'static,
    T: ChatTransport + 'static,
{
    match serde_json::from_slice::<TelegramUpdate>(&body) {
        Ok(update) => {
            let ctx = BotContext {
                reports: &state.reports,
                dispatcher: &state.dispatcher,
                access: &state.config.access,
            };
            let disposition = ctx.process_message(update.command_message()).await;
            if disposition != UpdateDisposition::Ignored {
                debug!(?disposition, "update handled");
            }
        }
        Err(err) => {
            error!(error = %err, "failed to decode telegram update");
            state
                .notify_admin(&format!("Bot Error in main handler: {err}"))
                .await;
        }
    }

    (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
}
