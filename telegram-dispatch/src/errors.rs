//! Error types for chat delivery.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Failure of a single `sendMessage` call.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The Bot API answered `ok: false`.
    #[error("telegram api error {code}: {description}")]
    Api { code: u16, description: String },

    /// Timeout at transport level.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without an API answer.
    #[error("network error: {0}")]
    Network(String),

    /// The API answered with something that is not a Bot API envelope.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl DispatchError {
    /// True when the message referenced by `reply_to_message_id` no longer
    /// exists ("Bad Request: message to be replied not found").
    pub fn is_reply_target_missing(&self) -> bool {
        match self {
            DispatchError::Api { description, .. } => description.contains("replied not found"),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for DispatchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return DispatchError::Timeout;
        }
        if e.is_decode() {
            return DispatchError::InvalidResponse(e.to_string());
        }
        DispatchError::Network(e.to_string())
    }
}
