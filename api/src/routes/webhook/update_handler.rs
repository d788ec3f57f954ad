//! Decides what a chat message asks for and sends the answer.

use sheet_source::SheetSource;
use telegram_dispatch::{ChatTransport, ChunkedDispatcher};
use ticket_reports::{ReportService, extract_incident_ids};
use tracing::{debug, info, warn};

use crate::{
    core::access::AccessList,
    routes::webhook::{
        command::{BotCommand, parse_command},
        telegram_update::CommandMessage,
    },
};

pub const ACCESS_DENIED: &str = "⛔️ Access denied.";
pub const INVALID_COMMAND: &str = "Sorry, that is not a valid report command.";
pub const GLOBAL_ACK: &str = "Generating global SQM(CCAN) report...";

/// What was done with one update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateDisposition {
    /// Not a complete text message.
    Ignored,
    Denied,
    Report { scope: String, generated: bool },
    InvalidCommand,
    /// Authorized text with neither a command nor incident ids.
    NoCommand,
    IncidentLookup { ids: Vec<String> },
}

/// Borrowed services needed to answer a message.
pub struct BotContext<'a, S, T> {
    pub reports: &'a ReportService<S>,
    pub dispatcher: &'a ChunkedDispatcher<T>,
    pub access: &'a AccessList,
}

impl<'a, S: SheetSource, T: ChatTransport> BotContext<'a, S, T> {
    async fn reply(&self, msg: &CommandMessage, text: &str) {
        self.dispatcher
            .deliver(msg.chat_id, text, Some(msg.message_id))
            .await;
    }

    async fn say(&self, msg: &CommandMessage, text: &str) {
        self.dispatcher.deliver(msg.chat_id, text, None).await;
    }

    /// Handles one message end to end. Report failures are sent as text, so
    /// nothing here returns an error.
    pub async fn process_message(&self, msg: Option<CommandMessage>) -> UpdateDisposition {
        let Some(msg) = msg else {
            return UpdateDisposition::Ignored;
        };

        if !self.access.is_authorized(msg.user_id, msg.chat_id) {
            warn!(
                chat_id = msg.chat_id,
                user_id = msg.user_id,
                "unauthorized sender"
            );
            self.reply(&msg, ACCESS_DENIED).await;
            return UpdateDisposition::Denied;
        }

        match parse_command(&msg.text, self.reports.config()) {
            Some(BotCommand::GlobalCcan) => {
                info!(chat_id = msg.chat_id, "global CCAN report requested");
                self.say(&msg, GLOBAL_ACK).await;
                let outcome = self.reports.ccan_report().await;
                self.say(&msg, outcome.text()).await;
                UpdateDisposition::Report {
                    scope: "Global".to_string(),
                    generated: outcome.is_generated(),
                }
            }
            Some(BotCommand::Regional(group)) => {
                info!(chat_id = msg.chat_id, region = %group.name, "regional report requested");
                self.say(&msg, &format!("Generating report for {}...", group.name))
                    .await;
                let outcome = self.reports.regional_report(group).await;
                self.say(&msg, outcome.text()).await;
                UpdateDisposition::Report {
                    scope: group.name.clone(),
                    generated: outcome.is_generated(),
                }
            }
            Some(BotCommand::Unrecognized) => {
                debug!(text = %msg.text, "unknown report command");
                self.reply(&msg, INVALID_COMMAND).await;
                UpdateDisposition::InvalidCommand
            }
            None => {
                let ids = extract_incident_ids(&msg.text);
                if ids.is_empty() {
                    return UpdateDisposition::NoCommand;
                }
                info!(chat_id = msg.chat_id, ids = ?ids, "incident lookup requested");
                let outcome = self.reports.incident_lookup(&ids).await;
                self.reply(&msg, outcome.text()).await;
                UpdateDisposition::IncidentLookup { ids }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use telegram_dispatch::OutgoingMessage;
    use ticket_reports::ReportConfig;

    use super::*;
    use crate::test_support::{FixtureSheets, RecordingTransport};

    fn message(user_id: i64, chat_id: i64, text: &str) -> Option<CommandMessage> {
        Some(CommandMessage {
            chat_id,
            user_id,
            message_id: 77,
            text: text.to_string(),
        })
    }

    struct Harness {
        reports: ReportService<FixtureSheets>,
        dispatcher: ChunkedDispatcher<RecordingTransport>,
        access: AccessList,
    }

    impl Harness {
        fn new(allowed: Vec<i64>) -> Self {
            Self {
                reports: ReportService::new(FixtureSheets::tickets(), ReportConfig::default()),
                dispatcher: ChunkedDispatcher::new(RecordingTransport::default()),
                access: AccessList::new(allowed),
            }
        }

        fn ctx(&self) -> BotContext<'_, FixtureSheets, RecordingTransport> {
            BotContext {
                reports: &self.reports,
                dispatcher: &self.dispatcher,
                access: &self.access,
            }
        }

        fn sent(&self) -> Vec<OutgoingMessage> {
            self.dispatcher.transport().sent()
        }
    }

    #[tokio::test]
    async fn unauthorized_sender_is_denied_with_a_reply() {
        let h = Harness::new(vec![42]);

        let disposition = h.ctx().process_message(message(99, 99, "/sqmbiak")).await;

        assert_eq!(disposition, UpdateDisposition::Denied);
        assert_eq!(
            h.sent(),
            vec![OutgoingMessage {
                chat_id: 99,
                text: ACCESS_DENIED.to_string(),
                reply_to_message_id: Some(77),
            }]
        );
    }

    #[tokio::test]
    async fn regional_command_acknowledges_then_reports() {
        let h = Harness::new(vec![42]);

        let disposition = h.ctx().process_message(message(42, 42, "/SQM Biak@bot")).await;

        assert_eq!(
            disposition,
            UpdateDisposition::Report {
                scope: "Biak".into(),
                generated: true
            }
        );
        let sent = h.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].text, "Generating report for Biak...");
        assert!(sent[1].text.contains("<code>INC1</code>"));
        assert!(sent.iter().all(|m| m.reply_to_message_id.is_none()));
    }

    #[tokio::test]
    async fn group_chat_members_may_request_global_report() {
        let h = Harness::new(vec![-100500]);

        let disposition = h.ctx().process_message(message(1, -100500, "/sqmccan")).await;

        // INSERA is missing from the fixture, so generation fails but still answers.
        assert_eq!(
            disposition,
            UpdateDisposition::Report {
                scope: "Global".into(),
                generated: false
            }
        );
        let sent = h.sent();
        assert_eq!(sent[0].text, GLOBAL_ACK);
        assert_eq!(sent[1].text, "Bot Error: Exception in SQM(CCAN) report.");
    }

    #[tokio::test]
    async fn unknown_report_command_gets_invalid_reply() {
        let h = Harness::new(vec![42]);

        let disposition = h.ctx().process_message(message(42, 42, "/sqmatlantis")).await;

        assert_eq!(disposition, UpdateDisposition::InvalidCommand);
        assert_eq!(h.sent()[0].text, INVALID_COMMAND);
        assert_eq!(h.sent()[0].reply_to_message_id, Some(77));
    }

    #[tokio::test]
    async fn incident_ids_trigger_a_lookup_reply() {
        let h = Harness::new(vec![42]);

        let disposition = h
            .ctx()
            .process_message(message(42, 42, "tolong cek inc999 dan INC1"))
            .await;

        assert_eq!(
            disposition,
            UpdateDisposition::IncidentLookup {
                ids: vec!["INC1".into(), "INC999".into()]
            }
        );
        let sent = h.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].reply_to_message_id, Some(77));
        assert!(sent[0].text.starts_with("📄 Detail Ticket: <code>INC1</code>"));
        assert!(sent[0]
            .text
            .ends_with("❌ Tidak ditemukan di sheet ALLTIKET: <code>INC999</code>"));
    }

    #[tokio::test]
    async fn plain_chatter_and_incomplete_updates_send_nothing() {
        let h = Harness::new(vec![42]);

        assert_eq!(
            h.ctx().process_message(message(42, 42, "selamat pagi")).await,
            UpdateDisposition::NoCommand
        );
        assert_eq!(h.ctx().process_message(None).await, UpdateDisposition::Ignored);
        assert!(h.sent().is_empty());
    }
}
