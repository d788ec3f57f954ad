use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sheet_source::SheetError;
use telegram_dispatch::DispatchError;
use thiserror::Error;
use ticket_reports::ChainError;

use crate::core::{config::ConfigError, http::response_envelope::ApiResponse};

/// Optional settings whose absence disables an operation at request time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingSetting {
    /// Neither `REPORT_CHAT_IDS` nor `MY_CHAT_ID` yields a chat id.
    Recipients,
    /// `PUBLIC_BASE_URL` is unset, so the service cannot call its own links.
    PublicBaseUrl,
}

impl MissingSetting {
    pub fn env_var(self) -> &'static str {
        match self {
            MissingSetting::Recipients => "REPORT_CHAT_IDS",
            MissingSetting::PublicBaseUrl => "PUBLIC_BASE_URL",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            MissingSetting::Recipients => "No report recipients configured.",
            MissingSetting::PublicBaseUrl => "Chained reports are disabled.",
        }
    }

    fn hint(self) -> &'static str {
        match self {
            MissingSetting::Recipients => {
                "Set REPORT_CHAT_IDS (or MY_CHAT_ID) to comma-separated chat ids."
            }
            MissingSetting::PublicBaseUrl => "Set PUBLIC_BASE_URL to this service's public URL.",
        }
    }
}

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to initialise sheets client: {0}")]
    SheetsInit(#[from] SheetError),

    #[error("failed to initialise telegram client: {0}")]
    TelegramInit(#[from] DispatchError),

    #[error("failed to initialise http client: {0}")]
    HttpInit(#[from] reqwest::Error),

    // --- IO / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / operation ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("{} ({} is not set)", .0.message(), .0.env_var())]
    NotConfigured(MissingSetting),

    /// Handing work to the next chain link failed.
    #[error("chain call failed: {0}")]
    Chain(#[from] ChainError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Chain(_) => StatusCode::BAD_GATEWAY,

            AppError::Config(_)
            | AppError::SheetsInit(_)
            | AppError::TelegramInit(_)
            | AppError::HttpInit(_)
            | AppError::Bind(_)
            | AppError::Server(_)
            | AppError::NotConfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::SheetsInit(_) => "SHEETS_INIT_ERROR",
            AppError::TelegramInit(_) => "TELEGRAM_INIT_ERROR",
            AppError::HttpInit(_) => "HTTP_INIT_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotConfigured(_) => "SERVER_CONFIG_ERROR",
            AppError::Chain(_) => "CHAIN_CALL_FAILED",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = ApiResponse::failure(self.error_code(), self.to_string());
        if let AppError::NotConfigured(setting) = self {
            body = body.with_detail(setting.env_var(), Some(setting.hint().to_string()));
        }
        body.into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}
