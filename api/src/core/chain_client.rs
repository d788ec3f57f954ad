//! HTTP client that calls this service's own `chain_link` endpoint.

use std::time::Duration;

use ticket_reports::{ChainError, ChainPayload, ChainResult, LinkInvoker};
use tracing::{debug, warn};

use crate::core::config::ChainConfig;

/// Path of the chain-link route, relative to the public base URL.
pub const CHAIN_LINK_PATH: &str = "/api/chain_link";

/// How a trigger call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAck {
    /// The first link answered with a success status.
    Confirmed,
    /// The first link did not answer within the trigger timeout; it is
    /// assumed to be running.
    Assumed,
}

#[derive(Debug, Clone)]
pub struct ChainClient {
    http: reqwest::Client,
    link_url: String,
    trigger_timeout: Duration,
    link_timeout: Duration,
}

impl ChainClient {
    /// `None` when no public base URL is configured.
    pub fn from_config(cfg: &ChainConfig) -> Result<Option<Self>, reqwest::Error> {
        let Some(base) = cfg.public_base_url.as_deref() else {
            return Ok(None);
        };

        // Connecting must finish well inside the trigger timeout, so a timeout
        // seen by `trigger` always means the request was already sent.
        let http = reqwest::Client::builder()
            .user_agent("sqm-report-bot/0.1")
            .connect_timeout(connect_timeout(cfg.trigger_timeout))
            .build()?;

        Ok(Some(Self {
            http,
            link_url: format!("{}{}", base.trim_end_matches('/'), CHAIN_LINK_PATH),
            trigger_timeout: cfg.trigger_timeout,
            link_timeout: cfg.link_timeout,
        }))
    }

    pub fn link_url(&self) -> &str {
        &self.link_url
    }

    async fn post(&self, payload: &ChainPayload, timeout: Duration) -> ChainResult<()> {
        debug!(url = %self.link_url, regions = ?payload.regions_left, "calling chain link");

        let resp = self
            .http
            .post(&self.link_url)
            .timeout(timeout)
            .json(payload)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ChainError::Rejected(status.as_u16()))
        }
    }

    /// Starts a cycle. A timeout after the connection was established means
    /// the request reached the first link and counts as accepted; connect
    /// failures never do.
    pub async fn trigger(&self, payload: &ChainPayload) -> ChainResult<TriggerAck> {
        match self.post(payload, self.trigger_timeout).await {
            Ok(()) => Ok(TriggerAck::Confirmed),
            Err(ChainError::Timeout) => {
                warn!(
                    timeout_secs = self.trigger_timeout.as_secs(),
                    "chain trigger timed out; assuming first link is running"
                );
                Ok(TriggerAck::Assumed)
            }
            Err(err) => Err(err),
        }
    }
}

impl LinkInvoker for ChainClient {
    async fn invoke(&self, payload: ChainPayload) -> ChainResult<()> {
        self.post(&payload, self.link_timeout).await
    }
}

/// Half the trigger timeout, at least 100 ms.
fn connect_timeout(trigger_timeout: Duration) -> Duration {
    (trigger_timeout / 2).max(Duration::from_millis(100))
}

fn map_transport_error(e: reqwest::Error) -> ChainError {
    classify_transport_error(
        e.is_connect(),
        e.is_timeout(),
        e.status().map(|s| s.as_u16()),
        e.to_string(),
    )
}

/// A connect-phase failure is checked first: reqwest also flags a connect
/// timeout as `is_timeout`, but nothing was sent.
fn classify_transport_error(
    is_connect: bool,
    is_timeout: bool,
    status: Option<u16>,
    message: String,
) -> ChainError {
    if is_connect {
        return ChainError::Network(message);
    }
    if is_timeout {
        return ChainError::Timeout;
    }
    if let Some(code) = status {
        return ChainError::Rejected(code);
    }
    ChainError::Network(message)
}

#[cfg(test)]
mod tests {
    use ticket_reports::ChainStrategy;

    use super::*;

    fn config(base: Option<&str>) -> ChainConfig {
        ChainConfig {
            public_base_url: base.map(str::to_string),
            strategy: ChainStrategy::Detached,
            trigger_timeout: Duration::from_secs(3),
            link_timeout: Duration::from_secs(240),
        }
    }

    #[test]
    fn no_base_url_means_no_client() {
        assert!(ChainClient::from_config(&config(None)).unwrap().is_none());
    }

    #[test]
    fn link_url_is_built_from_base() {
        let client = ChainClient::from_config(&config(Some("https://bot.example.app/")))
            .unwrap()
            .unwrap();
        assert_eq!(client.link_url(), "https://bot.example.app/api/chain_link");
    }

    #[test]
    fn connect_timeout_is_not_treated_as_sent() {
        assert!(matches!(
            classify_transport_error(true, true, None, "connect timed out".into()),
            ChainError::Network(_)
        ));
        assert!(matches!(
            classify_transport_error(false, true, None, "operation timed out".into()),
            ChainError::Timeout
        ));
        assert!(matches!(
            classify_transport_error(false, false, Some(503), String::new()),
            ChainError::Rejected(503)
        ));
        assert!(matches!(
            classify_transport_error(false, false, None, "reset".into()),
            ChainError::Network(_)
        ));
    }

    #[test]
    fn connect_timeout_stays_below_trigger_timeout() {
        assert_eq!(connect_timeout(Duration::from_secs(3)), Duration::from_millis(1500));
        assert_eq!(connect_timeout(Duration::from_millis(50)), Duration::from_millis(100));
    }

    #[tokio::test]
    async fn trigger_against_closed_port_is_not_assumed_accepted() {
        let client = ChainClient::from_config(&config(Some("http://127.0.0.1:1")))
            .unwrap()
            .unwrap();
        let err = client
            .trigger(&ChainPayload {
                regions_left: vec!["Biak".into()],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Network(_)));
    }

    #[tokio::test]
    async fn unreachable_link_is_a_network_error() {
        let client = ChainClient::from_config(&config(Some("http://127.0.0.1:1")))
            .unwrap()
            .unwrap();
        let err = client
            .invoke(ChainPayload {
                regions_left: vec!["Biak".into()],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Network(_)));
    }
}
