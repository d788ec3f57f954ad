pub mod core;
pub mod error_handler;
mod routes;
pub mod telemetry;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use sheet_source::SheetSource;
use telegram_dispatch::ChatTransport;
use tokio::signal;
use tracing::{info, warn};

use crate::{
    core::{app_state::AppState, config::AppConfig},
    error_handler::{AppError, AppResult},
    routes::{
        chain::{
            chain_link_route::chain_link_route, hourly_report_route::hourly_report_route,
            trigger_report_route::trigger_report_route,
        },
        ping_route::ping_route,
        webhook::webhook_route::webhook_route,
    },
};

/// All HTTP routes over the shared state.
pub fn router<S, T>(state: Arc<AppState<S, T>>) -> Router
where
    S: SheetSource + 'static,
    T: ChatTransport + 'static,
{
    Router::new()
        .route("/api/webhook", post(webhook_route::<S, T>))
        .route(
            "/api/trigger_report",
            get(trigger_report_route::<S, T>).post(trigger_report_route::<S, T>),
        )
        .route("/api/chain_link", post(chain_link_route::<S, T>))
        .route(
            "/api/hourly_report",
            get(hourly_report_route::<S, T>).post(hourly_report_route::<S, T>),
        )
        .route("/api/ping", get(ping_route))
        .with_state(state)
}

/// Reads configuration from the environment, builds the clients and serves
/// until Ctrl+C.
pub async fn start() -> AppResult<()> {
    let config = AppConfig::from_env()?;
    let address = config.api_address.clone();
    let state = Arc::new(AppState::from_config(config)?);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(AppError::Bind)?;
    info!(%address, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::{Value, json};
    use ticket_reports::{RegionGroup, ReportConfig};
    use tokio::net::TcpListener;

    use super::*;
    use crate::test_support::{self, FixtureSheets, RecordingTransport};

    const ADMIN: i64 = 900;
    const GROUP: i64 = -100;

    struct TestApp {
        base: String,
        state: Arc<AppState<FixtureSheets, RecordingTransport>>,
        http: reqwest::Client,
    }

    impl TestApp {
        /// Serves `router` on an ephemeral port; the chain calls back into
        /// the same server unless `configure` points it elsewhere.
        async fn spawn(
            transport: RecordingTransport,
            configure: impl FnOnce(&mut AppConfig),
        ) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base = format!("http://{}", listener.local_addr().unwrap());

            let mut config = test_support::config(&[
                ("MY_CHAT_ID", &ADMIN.to_string()),
                ("REPORT_CHAT_IDS", &GROUP.to_string()),
                ("PUBLIC_BASE_URL", &base),
            ]);
            configure(&mut config);

            let state =
                Arc::new(AppState::new(config, FixtureSheets::tickets(), transport).unwrap());
            let app = router(Arc::clone(&state));
            tokio::spawn(async move { axum::serve(listener, app).await });

            Self {
                base,
                state,
                http: reqwest::Client::new(),
            }
        }

        fn url(&self, path: &str) -> String {
            format!("{}{path}", self.base)
        }

        fn sent_to(&self, chat_id: i64) -> Vec<String> {
            self.state.dispatcher.transport().sent_to(chat_id)
        }

        async fn wait_for(&self, chat_id: i64, count: usize) -> Vec<String> {
            for _ in 0..100 {
                let sent = self.sent_to(chat_id);
                if sent.len() >= count {
                    return sent;
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            self.sent_to(chat_id)
        }
    }

    fn two_regions(config: &mut AppConfig) {
        config.report = ReportConfig::new(
            vec![
                RegionGroup::new("Alpha", ["BIAK"]),
                RegionGroup::new("Beta", ["MERAUKE"]),
            ],
            10.0,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn ping_answers_pong() {
        let app = TestApp::spawn(RecordingTransport::default(), |_| {}).await;

        let body = reqwest::get(app.url("/api/ping")).await.unwrap().text().await.unwrap();

        assert_eq!(body, "pong");
    }

    #[tokio::test]
    async fn malformed_update_is_acknowledged_and_reported_to_admin() {
        let app = TestApp::spawn(RecordingTransport::default(), |_| {}).await;

        let res = app
            .http
            .post(app.url("/api/webhook"))
            .body("{not json")
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), reqwest::StatusCode::OK);
        assert_eq!(res.json::<Value>().await.unwrap(), json!({"status": "ok"}));
        let admin = app.sent_to(ADMIN);
        assert_eq!(admin.len(), 1);
        assert!(admin[0].starts_with("Bot Error in main handler:"));
    }

    #[tokio::test]
    async fn cycle_completes_when_sends_outlast_the_trigger_timeout() {
        // Each send takes longer than the trigger waits for the first link.
        let app = TestApp::spawn(RecordingTransport::slow(Duration::from_millis(300)), |cfg| {
            two_regions(cfg);
            cfg.chain.trigger_timeout = Duration::from_millis(200);
            cfg.chain.link_timeout = Duration::from_secs(5);
        })
        .await;

        let res = app.http.post(app.url("/api/trigger_report")).send().await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::ACCEPTED);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["data"]["regions"], json!(["Alpha", "Beta"]));

        let sent = app.wait_for(GROUP, 3).await;
        assert_eq!(sent.len(), 3, "reports delivered: {sent:?}");
        assert!(sent[0].contains("Alpha"));
        assert!(sent[1].contains("Beta"));
        assert!(sent[2].contains("SQM(CCAN)"));
        assert!(app.sent_to(ADMIN).is_empty());
    }

    #[tokio::test]
    async fn chain_link_answers_before_publishing() {
        let app = TestApp::spawn(RecordingTransport::slow(Duration::from_millis(300)), two_regions)
            .await;

        let res = app
            .http
            .post(app.url("/api/chain_link"))
            .json(&json!({"regions_left": ["Beta"]}))
            .timeout(Duration::from_millis(250))
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), reqwest::StatusCode::ACCEPTED);
        assert_eq!(
            res.json::<Value>().await.unwrap()["data"],
            json!({"region": "Beta", "regions_next": []})
        );
        let sent = app.wait_for(GROUP, 2).await;
        assert!(sent[0].contains("Beta"));
        assert!(sent[1].contains("SQM(CCAN)"));
    }

    #[tokio::test]
    async fn unreachable_chain_is_a_bad_gateway_with_admin_notice() {
        let app = TestApp::spawn(RecordingTransport::default(), |cfg| {
            cfg.chain.public_base_url = Some("http://127.0.0.1:1".to_string());
        })
        .await;

        let res = app.http.post(app.url("/api/trigger_report")).send().await.unwrap();

        assert_eq!(res.status(), reqwest::StatusCode::BAD_GATEWAY);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["success"], json!(false));
        let admin = app.sent_to(ADMIN);
        assert_eq!(admin.len(), 1);
        assert!(admin[0].starts_with("Bot Error: failed to start report cycle:"));
        assert!(app.sent_to(GROUP).is_empty());
    }

    #[tokio::test]
    async fn malformed_chain_payload_is_a_bad_request() {
        let app = TestApp::spawn(RecordingTransport::default(), |_| {}).await;

        let res = app
            .http
            .post(app.url("/api/chain_link"))
            .header("content-type", "application/json")
            .body(r#"{"regions_left": "Biak"}"#)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(
            res.json::<Value>().await.unwrap()["error"]["code"],
            json!("BAD_REQUEST")
        );
        assert!(app.state.dispatcher.transport().sent().is_empty());
    }

    #[tokio::test]
    async fn missing_recipients_name_the_variable() {
        let app = TestApp::spawn(RecordingTransport::default(), |cfg| {
            cfg.recipients.clear();
        })
        .await;

        let res = app.http.post(app.url("/api/hourly_report")).send().await.unwrap();

        assert_eq!(res.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"]["details"][0]["path"], json!("REPORT_CHAT_IDS"));
        let admin = app.sent_to(ADMIN);
        assert_eq!(admin.len(), 1);
        assert!(admin[0].contains("Set REPORT_CHAT_IDS."));
    }
}
