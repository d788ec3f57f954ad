//! Crate-wide error hierarchy for sheet-source.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type SheetResult<T> = Result<T, SheetError>;

/// Root error type for spreadsheet access.
#[derive(Debug, Error)]
pub enum SheetError {
    /// Service-account JSON is absent, malformed or lacks a required field.
    #[error("invalid service account credentials: {0}")]
    Credentials(String),

    /// The RS256 token assertion could not be signed.
    #[error("failed to sign token assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// The OAuth token endpoint refused the assertion.
    #[error("token exchange rejected: {0}")]
    TokenRejected(String),

    /// The requested tab does not exist in the spreadsheet.
    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    /// Unauthorized (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden (HTTP 403), usually the sheet is not shared with the account.
    #[error("forbidden")]
    Forbidden,

    /// Rate limited (HTTP 429).
    #[error("rate limited")]
    RateLimited,

    /// Gateway / server error (HTTP 5xx).
    #[error("server error: status {0}")]
    Server(u16),

    /// Other non-2xx status not covered above.
    #[error("http status error: status {0}")]
    HttpStatus(u16),

    /// Timeout at transport level.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without HTTP status (DNS/connect/reset).
    #[error("network error: {0}")]
    Network(String),

    /// Unexpected shape of the API response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl SheetError {
    /// Maps a non-success HTTP status to the matching variant.
    pub fn from_status(code: u16) -> Self {
        match code {
            401 => SheetError::Unauthorized,
            403 => SheetError::Forbidden,
            429 => SheetError::RateLimited,
            500..=599 => SheetError::Server(code),
            _ => SheetError::HttpStatus(code),
        }
    }
}

impl From<reqwest::Error> for SheetError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return SheetError::Timeout;
        }

        if let Some(status) = e.status() {
            return SheetError::from_status(status.as_u16());
        }

        if e.is_decode() {
            return SheetError::InvalidResponse(e.to_string());
        }

        SheetError::Network(e.to_string())
    }
}
