//! Telegram Bot API client (only `sendMessage` is needed).

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ChatTransport, DispatchError, DispatchResult, OutgoingMessage};

/// Default Bot API base.
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Runtime configuration for [`TelegramClient`].
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// API base without the `/bot<token>` suffix.
    pub api_base: String,
    /// Upper bound for a single `sendMessage` call.
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_message_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct BotApiResponse {
    ok: bool,
    #[serde(default)]
    error_code: Option<u16>,
    #[serde(default)]
    description: Option<String>,
}

/// Bot API HTTP client wrapper.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: Client,
    send_url: String,
}

impl TelegramClient {
    pub fn from_config(cfg: TelegramConfig) -> DispatchResult<Self> {
        debug!("Creating TelegramClient with api_base={}", cfg.api_base);

        let http = Client::builder()
            .user_agent("sqm-report-bot/0.1")
            .timeout(cfg.timeout)
            .build()?;

        let send_url = format!(
            "{}/bot{}/sendMessage",
            cfg.api_base.trim_end_matches('/'),
            cfg.bot_token
        );

        Ok(Self { http, send_url })
    }
}

impl ChatTransport for TelegramClient {
    async fn send_message(&self, message: &OutgoingMessage) -> DispatchResult<()> {
        let body = SendMessageRequest {
            chat_id: message.chat_id,
            text: &message.text,
            parse_mode: "HTML",
            reply_to_message_id: message.reply_to_message_id,
        };

        // Error answers (400/403/429) still carry the JSON envelope, so the
        // status is not checked before decoding.
        let resp = self.http.post(&self.send_url).json(&body).send().await?;
        let status = resp.status();
        let parsed: BotApiResponse = resp
            .json()
            .await
            .map_err(|e| DispatchError::InvalidResponse(format!("HTTP {status}: {e}")))?;

        if parsed.ok {
            debug!(chat_id = message.chat_id, "message sent");
            return Ok(());
        }

        Err(DispatchError::Api {
            code: parsed.error_code.unwrap_or(status.as_u16()),
            description: parsed.description.unwrap_or_default(),
        })
    }
}
