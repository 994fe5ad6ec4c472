//! Admin notifications over the active channel.

use async_trait::async_trait;
use kora_core::{
    error::KoraError,
    message::OutgoingMessage,
    traits::{Channel, Notifier},
};
use std::sync::Arc;

/// Sends notices to the configured admin as ordinary text messages.
pub struct AdminNotifier {
    channel: Arc<dyn Channel>,
    admin_id: String,
    max_len: usize,
}

impl AdminNotifier {
    pub fn new(channel: Arc<dyn Channel>, admin_id: &str, max_len: usize) -> Self {
        Self {
            channel,
            admin_id: admin_id.to_string(),
            max_len: max_len.max(1),
        }
    }
}

#[async_trait]
impl Notifier for AdminNotifier {
    async fn notify_admin(&self, text: &str) -> Result<(), KoraError> {
        if self.admin_id.is_empty() {
            return Err(KoraError::Config("no admin_id configured".into()));
        }
        // Notices are single messages; overflow is cut.
        let text: String = text.chars().take(self.max_len).collect();
        self.channel
            .send(OutgoingMessage::text(&self.admin_id, text))
            .await
    }
}
