//! Chunked, failure-tolerant delivery.
//!
//! Every chunk moves through a small state machine:
//!
//! ```text
//! Pending ──ok──────────────────────────────▶ Sent
//!    │──reply target missing ─▶ retry w/o ref ─▶ SentWithoutReply
//!    └──network / api error ─────────────────▶ Failed (this chunk only)
//! ```

use tracing::{debug, info, warn};

use crate::{
    ChatTransport, OutgoingMessage,
    chunking::{MAX_MESSAGE_UNITS, split_into_chunks},
};

/// Delivery state of one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkState {
    Pending,
    Sent,
    /// Sent after dropping a reply reference whose target had vanished.
    SentWithoutReply,
    Failed(String),
}

impl ChunkState {
    pub fn is_delivered(&self) -> bool {
        matches!(self, ChunkState::Sent | ChunkState::SentWithoutReply)
    }
}

/// Outcome of delivering one text to one chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub chat_id: i64,
    pub chunks: Vec<ChunkState>,
}

impl DeliveryReport {
    pub fn delivered(&self) -> usize {
        self.chunks.iter().filter(|c| c.is_delivered()).count()
    }

    pub fn failed(&self) -> usize {
        self.chunks
            .iter()
            .filter(|c| matches!(c, ChunkState::Failed(_)))
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.chunks.iter().all(ChunkState::is_delivered)
    }
}

/// Splits text into transport-safe chunks and sends them in order.
#[derive(Debug, Clone)]
pub struct ChunkedDispatcher<T> {
    transport: T,
    max_units: usize,
}

impl<T: ChatTransport> ChunkedDispatcher<T> {
    pub fn new(transport: T) -> Self {
        Self::with_limit(transport, MAX_MESSAGE_UNITS)
    }

    pub fn with_limit(transport: T, max_units: usize) -> Self {
        Self {
            transport,
            max_units,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Delivers `text` to `chat_id`. Only the first chunk carries `reply_to`.
    ///
    /// Failures are recorded per chunk and never stop later chunks.
    pub async fn deliver(&self, chat_id: i64, text: &str, reply_to: Option<i64>) -> DeliveryReport {
        let chunks = split_into_chunks(text, self.max_units);
        if chunks.is_empty() {
            warn!(chat_id, "nothing to deliver: empty text");
        }

        let mut states = vec![ChunkState::Pending; chunks.len()];
        let total = chunks.len();

        for (idx, chunk) in chunks.into_iter().enumerate() {
            let reply = if idx == 0 { reply_to } else { None };
            let state = self.send_chunk(chat_id, chunk, reply).await;

            if let ChunkState::Failed(reason) = &state {
                warn!(chat_id, chunk = idx + 1, total, %reason, "chunk delivery failed");
            }
            states[idx] = state;
        }

        let report = DeliveryReport {
            chat_id,
            chunks: states,
        };
        debug!(
            chat_id,
            delivered = report.delivered(),
            failed = report.failed(),
            "delivery finished"
        );
        report
    }

    /// Delivers the same text to every recipient, independently.
    pub async fn deliver_to_all(&self, recipients: &[i64], text: &str) -> Vec<DeliveryReport> {
        let mut reports = Vec::with_capacity(recipients.len());
        for &chat_id in recipients {
            reports.push(self.deliver(chat_id, text, None).await);
        }

        let incomplete = reports.iter().filter(|r| !r.is_complete()).count();
        info!(
            recipients = recipients.len(),
            incomplete, "report delivered to recipients"
        );
        reports
    }

    async fn send_chunk(&self, chat_id: i64, text: String, reply_to: Option<i64>) -> ChunkState {
        let mut message = OutgoingMessage {
            chat_id,
            text,
            reply_to_message_id: reply_to,
        };

        match self.transport.send_message(&message).await {
            Ok(()) => ChunkState::Sent,
            Err(err) if reply_to.is_some() && err.is_reply_target_missing() => {
                debug!(chat_id, "reply target vanished; resending without reference");
                message.reply_to_message_id = None;
                match self.transport.send_message(&message).await {
                    Ok(()) => ChunkState::SentWithoutReply,
                    Err(err) => ChunkState::Failed(err.to_string()),
                }
            }
            Err(err) => ChunkState::Failed(err.to_string()),
        }
    }
}
