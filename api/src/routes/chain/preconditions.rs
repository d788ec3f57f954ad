use sheet_source::SheetSource;
use telegram_dispatch::ChatTransport;
use tracing::error;

use crate::{
    core::{app_state::AppState, chain_client::ChainClient},
    error_handler::{AppError, AppResult, MissingSetting},
};

async fn refuse<S: SheetSource, T: ChatTransport>(
    state: &AppState<S, T>,
    operation: &str,
    missing: MissingSetting,
) -> AppError {
    error!(operation, setting = missing.env_var(), "operation refused");
    state
        .notify_admin(&format!(
            "Bot Error: {operation} aborted. {} Set {}.",
            missing.message(),
            missing.env_var()
        ))
        .await;
    AppError::NotConfigured(missing)
}

/// Recipients for scheduled reports; refuses when there are none.
pub async fn require_recipients<'a, S: SheetSource, T: ChatTransport>(
    state: &'a AppState<S, T>,
    operation: &str,
) -> AppResult<&'a [i64]> {
    if state.config.recipients.is_empty() {
        return Err(refuse(state, operation, MissingSetting::Recipients).await);
    }
    Ok(&state.config.recipients)
}

/// Client for the next chain link; refuses without a public base URL.
pub async fn require_chain<'a, S: SheetSource, T: ChatTransport>(
    state: &'a AppState<S, T>,
    operation: &str,
) -> AppResult<&'a ChainClient> {
    match &state.chain {
        Some(client) => Ok(client),
        None => Err(refuse(state, operation, MissingSetting::PublicBaseUrl).await),
    }
}
