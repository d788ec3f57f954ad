//! Google Sheets provider (REST v4), read-only.
//!
//! Endpoints used:
//!   * POST {token_uri}                                  (JWT bearer grant)
//!   * GET  /v4/spreadsheets/:id/values/:range           (cell values)
//!
//! Authentication follows the service-account flow: an RS256-signed
//! assertion is exchanged for a short-lived access token, which is reused
//! across fetches until shortly before it expires. Sheet values are never
//! cached.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{Grid, SheetError, SheetResult, SheetSource};

const READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// A cached token is renewed this long before its reported expiry.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Default Sheets API base.
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// The subset of a service-account key file needed for the JWT grant.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    /// Parses the JSON key file content (as stored in `GOOGLE_CREDENTIALS_JSON`).
    pub fn from_json(raw: &str) -> SheetResult<Self> {
        let key: ServiceAccountKey =
            serde_json::from_str(raw).map_err(|e| SheetError::Credentials(e.to_string()))?;

        if key.client_email.trim().is_empty() {
            return Err(SheetError::Credentials("client_email is empty".into()));
        }
        if !key.private_key.contains("PRIVATE KEY") {
            return Err(SheetError::Credentials(
                "private_key is not a PEM encoded key".into(),
            ));
        }

        Ok(key)
    }
}

/// Runtime configuration for [`GoogleSheetsClient`].
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub credentials: ServiceAccountKey,
    /// API base, e.g. "https://sheets.googleapis.com/v4/spreadsheets".
    pub api_base: String,
    /// Upper bound for every outbound call (token exchange and value fetch).
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn usable_at(&self, now: DateTime<Utc>) -> bool {
        now + TimeDelta::seconds(TOKEN_REFRESH_MARGIN_SECS) < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// Google Sheets HTTP client wrapper. Clones share one token cache.
#[derive(Debug, Clone)]
pub struct GoogleSheetsClient {
    http: Client,
    cfg: SheetsConfig,
    token: Arc<Mutex<Option<CachedToken>>>,
}

impl GoogleSheetsClient {
    /// Builds a client with a bounded timeout and a stable user agent.
    pub fn from_config(cfg: SheetsConfig) -> SheetResult<Self> {
        debug!(
            spreadsheet = %cfg.spreadsheet_id,
            account = %cfg.credentials.client_email,
            "Initializing Google Sheets client"
        );

        let http = Client::builder()
            .user_agent("sqm-report-bot/0.1")
            .timeout(cfg.timeout)
            .build()?;

        Ok(Self {
            http,
            cfg,
            token: Arc::new(Mutex::new(None)),
        })
    }

    fn cached_token(&self, now: DateTime<Utc>) -> Option<String> {
        let guard = self.token.lock().ok()?;
        guard
            .as_ref()
            .filter(|t| t.usable_at(now))
            .map(|t| t.value.clone())
    }

    fn store_token(&self, value: String, issued_at: DateTime<Utc>, lifetime_secs: i64) {
        if let Ok(mut guard) = self.token.lock() {
            *guard = Some(CachedToken {
                value,
                expires_at: issued_at + TimeDelta::seconds(lifetime_secs),
            });
        }
    }

    /// Cached access token, or a new one from a freshly signed assertion.
    async fn access_token(&self) -> SheetResult<String> {
        let issued_at = Utc::now();
        if let Some(token) = self.cached_token(issued_at) {
            return Ok(token);
        }

        let key = &self.cfg.credentials;
        let now = issued_at.timestamp();
        let claims = AssertionClaims {
            iss: &key.client_email,
            scope: READONLY_SCOPE,
            aud: &key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &signing_key)?;

        let resp = self
            .http
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, "token exchange failed");
            return Err(SheetError::TokenRejected(format!("HTTP {status}: {}", snippet(&body))));
        }

        let token: TokenResponse = resp.json().await?;
        let lifetime = token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        debug!(lifetime_secs = lifetime, "access token obtained");
        self.store_token(token.access_token.clone(), issued_at, lifetime);
        Ok(token.access_token)
    }

    /// Fetches every cell of `sheet_name` as formatted strings.
    pub async fn get_values(&self, sheet_name: &str) -> SheetResult<Grid> {
        let url = values_url(&self.cfg.api_base, &self.cfg.spreadsheet_id, sheet_name);
        debug!("Sheets get_values: {}", url);

        let token = self.access_token().await?;
        let resp = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&[
                ("majorDimension", "ROWS"),
                ("valueRenderOption", "FORMATTED_VALUE"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::BAD_REQUEST {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_bad_request(sheet_name, &body));
        }
        if !status.is_success() {
            return Err(SheetError::from_status(status.as_u16()));
        }

        let range: ValueRange = resp.json().await?;
        debug!(sheet = sheet_name, rows = range.values.len(), "sheet values fetched");
        Ok(range.values)
    }
}

impl SheetSource for GoogleSheetsClient {
    async fn fetch_grid(&self, sheet_name: &str) -> SheetResult<Grid> {
        self.get_values(sheet_name).await
    }
}

/// Builds the `values` URL for a whole tab. The tab name is quoted as an A1
/// range so names with spaces or punctuation resolve correctly.
fn values_url(api_base: &str, spreadsheet_id: &str, sheet_name: &str) -> String {
    let range = format!("'{}'", sheet_name.replace('\'', "''"));
    format!(
        "{}/{}/values/{}",
        api_base.trim_end_matches('/'),
        urlencoding::encode(spreadsheet_id),
        urlencoding::encode(&range)
    )
}

/// The API answers 400 "Unable to parse range" for a missing tab.
fn classify_bad_request(sheet_name: &str, body: &str) -> SheetError {
    let message = serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());

    if message.contains("Unable to parse range") {
        SheetError::SheetNotFound(sheet_name.to_string())
    } else {
        SheetError::InvalidResponse(snippet(&message).to_string())
    }
}

fn snippet(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map(|(idx, _)| idx)
        .unwrap_or(body.len());
    body[..end].trim()
}
