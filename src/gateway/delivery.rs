//! Delivery pipeline: turns a `HandlerResult` into platform sends.
//!
//! Text is split to the platform limit; images are uploaded first and sent
//! by reference. Every successfully sent unit is recorded as a bot turn.

use kora_channels::split_message;
use kora_core::{
    message::OutgoingMessage,
    result::{HandlerResult, Payload, StructuredMessage},
    traits::Channel,
    turn::{ConversationTurn, MessageType},
};
use kora_memory::Store;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Recorded in place of an image the bot sent.
pub const IMAGE_SENT: &str = "[Image sent]";

/// Sent when an image could not be uploaded to the platform.
pub const IMAGE_UPLOAD_FAILED: &str =
    "⚠️ I couldn't send the image right now. Please try again later.";

/// One deliverable piece of a handler result.
#[derive(Debug, PartialEq, Eq)]
enum Unit {
    Text { text: String, kind: MessageType },
    Image { data: Vec<u8>, mime_type: String },
}

/// Flatten a result into ordered units. Failed structured text is recorded
/// as an error turn; plain text takes `text_kind`.
fn units(result: HandlerResult, text_kind: MessageType) -> Vec<Unit> {
    let structured = |msg: StructuredMessage| match msg.payload {
        Payload::Text(text) => Unit::Text {
            text,
            kind: if msg.success {
                text_kind
            } else {
                MessageType::Error
            },
        },
        Payload::Image { data, mime_type } => Unit::Image { data, mime_type },
    };

    match result {
        HandlerResult::PlainText(text) => vec![Unit::Text {
            text,
            kind: text_kind,
        }],
        HandlerResult::Structured(msg) => vec![structured(msg)],
        HandlerResult::List(items) => items.into_iter().map(structured).collect(),
    }
}

/// Sends handler output to one recipient over the active channel.
#[derive(Clone)]
pub struct Delivery {
    channel: Arc<dyn Channel>,
    store: Store,
    max_len: usize,
}

impl Delivery {
    pub fn new(channel: Arc<dyn Channel>, store: Store, max_len: usize) -> Self {
        Self {
            channel,
            store,
            max_len: max_len.max(1),
        }
    }

    /// Deliver a result in order. Stops at the first failed send and returns
    /// `false`; units already sent stay sent.
    pub async fn deliver(
        &self,
        recipient: &str,
        result: HandlerResult,
        text_kind: MessageType,
    ) -> bool {
        for unit in units(result, text_kind) {
            let sent = match unit {
                Unit::Text { text, kind } => self.send_text(recipient, &text, kind).await,
                Unit::Image { data, mime_type } => {
                    self.send_image(recipient, &data, &mime_type).await
                }
            };
            if !sent {
                return false;
            }
        }
        true
    }

    /// Send text split to the platform limit, recording each chunk once sent.
    pub async fn send_text(&self, recipient: &str, text: &str, kind: MessageType) -> bool {
        self.send_chunks(recipient, text, kind, None).await
    }

    /// Like `send_text`, but every recorded chunk carries `metadata`.
    pub async fn send_text_with_metadata(
        &self,
        recipient: &str,
        text: &str,
        kind: MessageType,
        metadata: Value,
    ) -> bool {
        self.send_chunks(recipient, text, kind, Some(&metadata)).await
    }

    async fn send_chunks(
        &self,
        recipient: &str,
        text: &str,
        kind: MessageType,
        metadata: Option<&Value>,
    ) -> bool {
        let chunks = split_message(text, self.max_len);
        if chunks.len() > 1 {
            debug!("splitting reply to {recipient} into {} parts", chunks.len());
        }
        for chunk in chunks {
            if let Err(e) = self
                .channel
                .send(OutgoingMessage::text(recipient, chunk))
                .await
            {
                warn!("send to {recipient} failed: {e}");
                return false;
            }
            let mut turn = ConversationTurn::from_bot(recipient, chunk, kind);
            if let Some(metadata) = metadata {
                turn = turn.with_metadata(metadata.clone());
            }
            self.store.record(&turn).await;
        }
        true
    }

    async fn send_image(&self, recipient: &str, data: &[u8], mime_type: &str) -> bool {
        let reference = match self.channel.upload(data, mime_type).await {
            Ok(reference) => reference,
            Err(e) => {
                warn!("image upload for {recipient} failed: {e}");
                self.send_text(recipient, IMAGE_UPLOAD_FAILED, MessageType::Error)
                    .await;
                return false;
            }
        };

        if let Err(e) = self
            .channel
            .send(OutgoingMessage::attachment(recipient, reference.as_str()))
            .await
        {
            warn!("attachment send to {recipient} failed: {e}");
            return false;
        }

        let turn = ConversationTurn::from_bot(recipient, IMAGE_SENT, MessageType::Image)
            .with_metadata(json!({ "attachment_id": reference }));
        self.store.record(&turn).await;
        true
    }
}
