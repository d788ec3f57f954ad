use sheet_source::{GoogleSheetsClient, SheetSource};
use telegram_dispatch::{ChatTransport, ChunkedDispatcher, TelegramClient};
use ticket_reports::ReportService;
use tracing::{info, warn};

use crate::{
    core::{chain_client::ChainClient, config::AppConfig},
    error_handler::AppResult,
};

/// Shared state for all HTTP handlers. Production uses the defaults; tests
/// plug in in-memory sources and transports.
pub struct AppState<S = GoogleSheetsClient, T = TelegramClient> {
    pub config: AppConfig,
    pub reports: ReportService<S>,
    pub dispatcher: ChunkedDispatcher<T>,
    /// Absent when `PUBLIC_BASE_URL` is not set.
    pub chain: Option<ChainClient>,
}

impl AppState {
    /// Builds the Google Sheets and Telegram clients. Fails only on
    /// startup-fatal problems.
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        let sheets = GoogleSheetsClient::from_config(config.sheets.clone())?;
        let telegram = TelegramClient::from_config(config.telegram.clone())?;
        Self::new(config, sheets, telegram)
    }
}

impl<S: SheetSource, T: ChatTransport> AppState<S, T> {
    pub fn new(config: AppConfig, source: S, transport: T) -> AppResult<Self> {
        let chain = ChainClient::from_config(&config.chain)?;

        if chain.is_none() {
            warn!("PUBLIC_BASE_URL not set; chained reporting is disabled");
        }
        if config.recipients.is_empty() {
            warn!("no report recipients configured");
        }
        info!(
            regions = config.report.region_groups().len(),
            recipients = config.recipients.len(),
            authorized = config.access.ids().len(),
            "application state ready"
        );

        Ok(Self {
            reports: ReportService::new(source, config.report.clone()),
            dispatcher: ChunkedDispatcher::new(transport),
            chain,
            config,
        })
    }

    /// Sends a diagnostic to the admin chat, if one is configured.
    pub async fn notify_admin(&self, text: &str) {
        match self.config.access.admin() {
            Some(admin) => {
                self.dispatcher.deliver(admin, text, None).await;
            }
            None => warn!(diagnostic = text, "no admin chat configured; diagnostic dropped"),
        }
    }
}
