use crate::{
    context::{Completion, Context},
    error::KoraError,
    message::{Attachment, IncomingMessage, OutgoingMessage},
    result::HandlerResult,
};
use async_trait::async_trait;

/// AI Provider trait: the brain.
///
/// The chat backend is a black box: a conversation context goes in, reply
/// text comes out. Image analysis is a separate one-shot capability.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Send a conversation context to the provider and get a response.
    async fn complete(&self, context: &Context) -> Result<Completion, KoraError>;

    /// Describe/answer questions about an image.
    async fn analyze_image(
        &self,
        image: &[u8],
        mime_type: &str,
        prompt: &str,
    ) -> Result<Completion, KoraError>;

    /// Check if the provider is available and ready.
    async fn is_available(&self) -> bool;
}

/// Messaging Channel trait: the nervous system.
///
/// A platform delivers inbound events through `start()` and accepts sends of
/// text or previously uploaded attachment references.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Start listening for incoming messages.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<IncomingMessage>, KoraError>;

    /// Send one message. Text must already fit the platform limit.
    async fn send(&self, message: OutgoingMessage) -> Result<(), KoraError>;

    /// Upload binary content to the platform's attachment store.
    ///
    /// Returns an opaque reference for [`OutgoingMessage::attachment`].
    async fn upload(&self, data: &[u8], mime_type: &str) -> Result<String, KoraError>;

    /// Download the raw bytes of an inbound attachment.
    async fn fetch_attachment(&self, attachment: &Attachment) -> Result<Vec<u8>, KoraError> {
        attachment
            .data
            .clone()
            .ok_or_else(|| KoraError::Channel("attachment has no inline data".into()))
    }

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), KoraError>;
}

/// A command plugin: a named, stateless handler invoked as `<prefix><name> <args>`.
#[async_trait]
pub trait CommandPlugin: Send + Sync {
    /// Invocation token, matched case-insensitively.
    fn name(&self) -> &str;

    /// One-line description for help listings.
    fn description(&self) -> &str {
        "No description available."
    }

    /// Run the command. Errors are turned into a generic failure reply by the dispatcher.
    async fn execute(&self, args: &str, sender_id: &str) -> Result<HandlerResult, KoraError>;
}

/// Out-of-band notifications to the bot owner (error reports, user reports).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_admin(&self, text: &str) -> Result<(), KoraError>;
}
