//! Console channel: writes replies to stdout.
//!
//! Used by `kora ask` to run one message through the full pipeline without a
//! messaging platform.

use async_trait::async_trait;
use kora_core::{
    error::KoraError,
    message::{IncomingMessage, OutgoingBody, OutgoingMessage},
    traits::Channel,
};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Stdout sink. Inbound messages are injected directly by the caller.
#[derive(Default)]
pub struct ConsoleChannel;

impl ConsoleChannel {
    pub fn new() -> Self {
        Self
    }

    /// Render an outgoing message the way it is printed.
    pub fn render(message: &OutgoingMessage) -> String {
        match &message.body {
            OutgoingBody::Text(text) => text.clone(),
            OutgoingBody::Attachment(reference) => format!("[image: {reference}]"),
        }
    }
}

#[async_trait]
impl Channel for ConsoleChannel {
    fn name(&self) -> &str {
        "console"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, KoraError> {
        // Nothing arrives on its own; the receiver closes immediately.
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), KoraError> {
        println!("{}", Self::render(&message));
        Ok(())
    }

    async fn upload(&self, data: &[u8], mime_type: &str) -> Result<String, KoraError> {
        Ok(format!("console-{}-{mime_type}-{}b", Uuid::new_v4(), data.len()))
    }

    async fn stop(&self) -> Result<(), KoraError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_text_and_attachment() {
        assert_eq!(
            ConsoleChannel::render(&OutgoingMessage::text("u", "hello")),
            "hello"
        );
        assert_eq!(
            ConsoleChannel::render(&OutgoingMessage::attachment("u", "ref-1")),
            "[image: ref-1]"
        );
    }

    #[tokio::test]
    async fn test_upload_reference_mentions_size() {
        let channel = ConsoleChannel::new();
        let reference = channel.upload(&[0u8; 16], "image/png").await.unwrap();
        assert!(reference.starts_with("console-"));
        assert!(reference.ends_with("image/png-16b"));
    }

    #[tokio::test]
    async fn test_start_yields_closed_receiver() {
        let channel = ConsoleChannel::new();
        let mut rx = channel.start().await.unwrap();
        assert!(rx.recv().await.is_none());
    }
}
