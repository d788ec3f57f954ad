//! Delivery of report text to Telegram chats.
//!
//! * [`ChatTransport`] is the one-message seam to the chat service.
//! * [`TelegramClient`] implements it over the Bot API `sendMessage` call.
//! * [`ChunkedDispatcher`] splits long text on line boundaries and delivers
//!   the pieces in order, tolerating per-chunk failures.

pub mod chunking;
pub mod dispatcher;
mod errors;
pub mod telegram;

use std::future::Future;

pub use chunking::{MAX_MESSAGE_UNITS, split_into_chunks, utf16_len};
pub use dispatcher::{ChunkState, ChunkedDispatcher, DeliveryReport};
pub use errors::{DispatchError, DispatchResult};
pub use telegram::{TelegramClient, TelegramConfig};

/// One outbound chat message in Telegram's HTML parse mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub chat_id: i64,
    pub text: String,
    pub reply_to_message_id: Option<i64>,
}

/// A remote message-send API.
pub trait ChatTransport: Send + Sync {
    /// Sends exactly one message. Length limits are the caller's concern.
    fn send_message(
        &self,
        message: &OutgoingMessage,
    ) -> impl Future<Output = DispatchResult<()>> + Send;
}
