//! Per-message routing: command, attachment, free text.

use super::routing::Route;
use super::Gateway;
use kora_core::{
    error::KoraError,
    message::{Attachment, AttachmentType, IncomingMessage},
    result::HandlerResult,
    turn::{ConversationTurn, MessageType},
};
use serde_json::json;
use tracing::{debug, info, warn};

/// Apology when the AI backend cannot be reached.
pub const BACKEND_APOLOGY: &str =
    "🤖 Sorry, I couldn't reach my AI brain right now. Please try again in a moment.";

pub const UNSUPPORTED_ATTACHMENT: &str =
    "📎 Sorry, I can only look at images for now. Other attachments aren't supported.";

pub const NOT_UNDERSTOOD: &str = "🤔 Sorry, I didn't understand that message.";

/// Recorded for attachments the bot cannot read.
pub const SENT_ATTACHMENT: &str = "[Sent an attachment]";

/// Recorded for messages with neither text nor attachments.
pub const EMPTY_MESSAGE: &str = "[Empty message]";

impl Gateway {
    /// Route one inbound message and deliver the reply.
    ///
    /// Errors returned here are unexpected; the caller reports them.
    pub(super) async fn route(&self, incoming: &IncomingMessage) -> Result<(), KoraError> {
        let sender = incoming.sender_id.as_str();

        match Route::classify(incoming, self.registry.prefix()) {
            Route::Command { name, args } => {
                info!("[{}] command '{name}' from {sender}", incoming.channel);
                self.store
                    .record(&ConversationTurn::from_user(
                        sender,
                        incoming.text.trim(),
                        MessageType::Command,
                    ))
                    .await;
                let result = self.registry.dispatch(name, args, sender).await;
                self.delivery
                    .deliver(sender, result, MessageType::Text)
                    .await;
            }
            Route::Attachments => {
                for attachment in &incoming.attachments {
                    self.handle_attachment(incoming, attachment).await?;
                }
            }
            Route::FreeText(text) => {
                self.store
                    .record(&ConversationTurn::from_user(sender, text, MessageType::Text))
                    .await;
                self.handle_free_text(sender, text).await;
            }
            Route::Empty => {
                debug!("empty message from {sender}");
                self.store
                    .record(&ConversationTurn::from_user(
                        sender,
                        EMPTY_MESSAGE,
                        MessageType::Text,
                    ))
                    .await;
                self.delivery
                    .send_text(sender, NOT_UNDERSTOOD, MessageType::Text)
                    .await;
            }
        }
        Ok(())
    }

    async fn handle_free_text(&self, sender: &str, text: &str) {
        if self.wants_image(text) {
            info!("free text from {sender} classified as an image request");
            let result = self.registry.dispatch(&self.image_command, text, sender).await;
            self.delivery
                .deliver(sender, result, MessageType::Text)
                .await;
            return;
        }

        match self.sessions.send(sender, text).await {
            Ok(reply) => {
                self.delivery
                    .deliver(sender, HandlerResult::PlainText(reply), MessageType::Text)
                    .await;
            }
            Err(e) => self.backend_failure(sender, "chat", &e).await,
        }
    }

    /// Whether free text should go to the image command instead of chat.
    fn wants_image(&self, text: &str) -> bool {
        let Some(classifier) = &self.classifier else {
            return false;
        };
        if !self.registry.contains(&self.image_command) {
            return false;
        }
        classifier.classify(text) == super::intent::GENERATE_IMAGE
    }

    async fn handle_attachment(
        &self,
        incoming: &IncomingMessage,
        attachment: &Attachment,
    ) -> Result<(), KoraError> {
        let sender = incoming.sender_id.as_str();

        if attachment.file_type != AttachmentType::Image {
            debug!(
                "unsupported {:?} attachment from {sender}",
                attachment.file_type
            );
            let mut turn =
                ConversationTurn::from_user(sender, SENT_ATTACHMENT, MessageType::Text);
            if let Some(url) = &attachment.url {
                turn = turn.with_metadata(json!({ "url": url }));
            }
            self.store.record(&turn).await;
            self.delivery
                .send_text(sender, UNSUPPORTED_ATTACHMENT, MessageType::Text)
                .await;
            return Ok(());
        }

        let mut turn = ConversationTurn::from_user(
            sender,
            super::sessions::SENT_IMAGE,
            MessageType::Image,
        );
        if let Some(url) = &attachment.url {
            turn = turn.with_metadata(json!({ "url": url }));
        }
        self.store.record(&turn).await;

        let bytes = self.channel.fetch_attachment(attachment).await?;
        let mime_type = attachment.mime_type.as_deref().unwrap_or("image/jpeg");
        let caption = Some(incoming.text.trim()).filter(|t| !t.is_empty());
        info!(
            "[{}] analyzing {} byte image from {sender}",
            incoming.channel,
            bytes.len()
        );

        match self
            .sessions
            .analyze_image(sender, &bytes, mime_type, caption)
            .await
        {
            Ok(analysis) => match &attachment.url {
                Some(url) => {
                    self.delivery
                        .send_text_with_metadata(
                            sender,
                            &analysis,
                            MessageType::Analysis,
                            json!({ "response_to_image": url }),
                        )
                        .await;
                }
                None => {
                    self.delivery
                        .deliver(
                            sender,
                            HandlerResult::PlainText(analysis),
                            MessageType::Analysis,
                        )
                        .await;
                }
            },
            Err(e) => self.backend_failure(sender, "image analysis", &e).await,
        }
        Ok(())
    }

    /// Answer free text for a caller outside any messaging platform.
    ///
    /// Both turns are recorded like chat over a channel. Backend failures
    /// are reported to the admin and returned; nothing is sent.
    pub(crate) async fn ask(&self, user_id: &str, text: &str) -> Result<String, KoraError> {
        self.store
            .record(&ConversationTurn::from_user(user_id, text, MessageType::Text))
            .await;

        match self.sessions.send(user_id, text).await {
            Ok(reply) => {
                self.store
                    .record(&ConversationTurn::from_bot(user_id, &reply, MessageType::Text))
                    .await;
                Ok(reply)
            }
            Err(e) => {
                warn!("chat backend call for {user_id} failed: {e}");
                self.report(&format!("⚠️ chat failed for user {user_id}: {e}"))
                    .await;
                Err(e)
            }
        }
    }

    /// The session is already invalidated by the cache; report and apologize.
    async fn backend_failure(&self, sender: &str, what: &str, err: &KoraError) {
        warn!("{what} backend call for {sender} failed: {err}");
        self.report(&format!("⚠️ {what} failed for user {sender}: {err}"))
            .await;
        self.delivery
            .send_text(sender, BACKEND_APOLOGY, MessageType::Error)
            .await;
    }
}
