//! Process configuration read once from the environment.
//!
//! Variables are read through a lookup function so the same parsing runs
//! against `std::env` in production and against a map in tests.

use std::time::Duration;

use chrono_tz::Tz;
use sheet_source::{ServiceAccountKey, SheetsConfig, google::DEFAULT_SHEETS_API_BASE};
use telegram_dispatch::{TelegramConfig, telegram::DEFAULT_TELEGRAM_API_BASE};
use thiserror::Error;
use ticket_reports::{ChainStrategy, IncidentLayout, ReportConfig, ReportConfigError};

use crate::core::access::AccessList;

pub const DEFAULT_API_ADDRESS: &str = "0.0.0.0:3000";
const DEFAULT_TRIGGER_TIMEOUT_SECS: u64 = 3;
const DEFAULT_LINK_TIMEOUT_SECS: u64 = 240;
const DEFAULT_SHEETS_TIMEOUT_SECS: u64 = 20;
const DEFAULT_TELEGRAM_TIMEOUT_SECS: u64 = 10;

/// Error enum for environment-driven setup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (ids, thresholds, timeouts).
    #[error("invalid number in {var}: {reason}")]
    InvalidNumber {
        var: &'static str,
        reason: &'static str,
    },

    /// A value has the wrong shape (URL scheme, enum name, time zone).
    #[error("invalid value in {var}: {reason}")]
    InvalidFormat { var: &'static str, reason: String },

    /// Service-account JSON could not be used.
    #[error("invalid GOOGLE_CREDENTIALS_JSON: {0}")]
    Credentials(String),

    #[error(transparent)]
    Report(#[from] ReportConfigError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings for the chained reporting cycle.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Public base URL of this service, without trailing slash.
    pub public_base_url: Option<String>,
    pub strategy: ChainStrategy,
    pub trigger_timeout: Duration,
    pub link_timeout: Duration,
}

/// Immutable configuration shared by every handler.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_address: String,
    pub report: ReportConfig,
    pub sheets: SheetsConfig,
    pub telegram: TelegramConfig,
    pub access: AccessList,
    /// Chats that receive scheduled reports.
    pub recipients: Vec<i64>,
    pub chain: ChainConfig,
}

impl AppConfig {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = must_env(&lookup, "BOT_TOKEN")?;
        let spreadsheet_id = must_env(&lookup, "SPREADSHEET_ID")?;
        let credentials_json = must_env(&lookup, "GOOGLE_CREDENTIALS_JSON")?;
        let credentials = ServiceAccountKey::from_json(&credentials_json)
            .map_err(|e| ConfigError::Credentials(e.to_string()))?;

        let access = AccessList::new(parse_id_list(&lookup, "MY_CHAT_ID")?);
        let recipients = match opt_env(&lookup, "REPORT_CHAT_IDS") {
            Some(_) => parse_id_list(&lookup, "REPORT_CHAT_IDS")?,
            None => access.ids().to_vec(),
        };

        let mut report = ReportConfig::default();
        if let Some(threshold) = env_opt_f64(&lookup, "UMUR_THRESHOLD")? {
            report = ReportConfig::new(report.region_groups().to_vec(), threshold)?;
        }
        if let Some(zone) = opt_env(&lookup, "REPORT_TIMEZONE") {
            let tz = zone.trim().parse::<Tz>().map_err(|_| ConfigError::InvalidFormat {
                var: "REPORT_TIMEZONE",
                reason: format!("unknown time zone `{zone}`"),
            })?;
            report = report.with_timezone(tz);
        }
        if let Some(layout) = opt_env(&lookup, "INCIDENT_LAYOUT") {
            let layout = layout
                .parse::<IncidentLayout>()
                .map_err(|reason| ConfigError::InvalidFormat {
                    var: "INCIDENT_LAYOUT",
                    reason,
                })?;
            report = report.with_incident_layout(layout);
        }

        let public_base_url = match opt_env(&lookup, "PUBLIC_BASE_URL") {
            Some(url) => Some(normalize_base_url("PUBLIC_BASE_URL", &url)?),
            None => None,
        };
        let strategy = match opt_env(&lookup, "CHAIN_MODE") {
            Some(mode) => mode
                .parse::<ChainStrategy>()
                .map_err(|reason| ConfigError::InvalidFormat {
                    var: "CHAIN_MODE",
                    reason,
                })?,
            None => ChainStrategy::default(),
        };

        let seconds = |var: &'static str, default: u64| -> ConfigResult<Duration> {
            Ok(Duration::from_secs(
                env_opt_u64(&lookup, var)?.unwrap_or(default),
            ))
        };

        Ok(Self {
            api_address: opt_env(&lookup, "API_ADDRESS")
                .unwrap_or_else(|| DEFAULT_API_ADDRESS.to_string()),
            report,
            sheets: SheetsConfig {
                spreadsheet_id,
                credentials,
                api_base: DEFAULT_SHEETS_API_BASE.to_string(),
                timeout: seconds("SHEETS_TIMEOUT_SECS", DEFAULT_SHEETS_TIMEOUT_SECS)?,
            },
            telegram: TelegramConfig {
                bot_token,
                api_base: DEFAULT_TELEGRAM_API_BASE.to_string(),
                timeout: seconds("TELEGRAM_TIMEOUT_SECS", DEFAULT_TELEGRAM_TIMEOUT_SECS)?,
            },
            access,
            recipients,
            chain: ChainConfig {
                public_base_url,
                strategy,
                trigger_timeout: seconds("CHAIN_TRIGGER_TIMEOUT_SECS", DEFAULT_TRIGGER_TIMEOUT_SECS)?,
                link_timeout: seconds("CHAIN_LINK_TIMEOUT_SECS", DEFAULT_LINK_TIMEOUT_SECS)?,
            },
        })
    }
}

/// Trimmed value, `None` if unset or blank.
fn opt_env<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads a required variable.
pub fn must_env<F>(lookup: &F, name: &'static str) -> ConfigResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    opt_env(lookup, name).ok_or(ConfigError::MissingVar(name))
}

/// Parses an optional `u64` (`Ok(None)` if unset/empty).
pub fn env_opt_u64<F>(lookup: &F, name: &'static str) -> ConfigResult<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    match opt_env(lookup, name) {
        Some(v) => v.parse::<u64>().map(Some).map_err(|_| ConfigError::InvalidNumber {
            var: name,
            reason: "expected u64",
        }),
        None => Ok(None),
    }
}

/// Parses an optional finite `f64` (`Ok(None)` if unset/empty).
pub fn env_opt_f64<F>(lookup: &F, name: &'static str) -> ConfigResult<Option<f64>>
where
    F: Fn(&str) -> Option<String>,
{
    match opt_env(lookup, name) {
        Some(v) => v
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or(ConfigError::InvalidNumber {
                var: name,
                reason: "expected a finite number",
            }),
        None => Ok(None),
    }
}

/// Comma-separated chat ids. Empty entries are skipped; an unset variable is
/// an empty list.
pub fn parse_id_list<F>(lookup: &F, name: &'static str) -> ConfigResult<Vec<i64>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = opt_env(lookup, name) else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>().map_err(|_| ConfigError::InvalidNumber {
                var: name,
                reason: "expected comma-separated integer chat ids",
            })
        })
        .collect()
}

fn normalize_base_url(var: &'static str, value: &str) -> ConfigResult<String> {
    let url = if value.starts_with("http://") || value.starts_with("https://") {
        value.to_string()
    } else if value.contains("://") {
        return Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://".into(),
        });
    } else {
        // Hosting platforms often expose the bare host name.
        format!("https://{value}")
    };
    Ok(url.trim_end_matches('/').to_string())
}
