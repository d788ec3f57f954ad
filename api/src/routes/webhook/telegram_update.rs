use serde::Deserialize;

/// Subset of a Telegram `Update`. Every field is optional: updates the bot
/// does not understand are acknowledged and ignored.
#[derive(Debug, Default, Deserialize)]
pub struct TelegramUpdate {
    pub message: Option<IncomingMessage>,
    pub edited_message: Option<IncomingMessage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IncomingMessage {
    pub message_id: Option<i64>,
    pub chat: Option<ChatRef>,
    pub from: Option<UserRef>,
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatRef {
    pub id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserRef {
    pub id: i64,
}

/// A message with every field the bot needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMessage {
    pub chat_id: i64,
    pub user_id: i64,
    pub message_id: i64,
    /// Trimmed, non-empty.
    pub text: String,
}

impl TelegramUpdate {
    /// `message`, falling back to `edited_message`, if it carries chat,
    /// sender, id and non-blank text.
    pub fn command_message(&self) -> Option<CommandMessage> {
        let msg = self.message.as_ref().or(self.edited_message.as_ref())?;
        let text = msg.text.as_deref().map(str::trim).filter(|t| !t.is_empty())?;

        Some(CommandMessage {
            chat_id: msg.chat.as_ref()?.id,
            user_id: msg.from.as_ref()?.id,
            message_id: msg.message_id?,
            text: text.to_string(),
        })
    }
}
