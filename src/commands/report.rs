//! `report`: forwards a user's message to the bot owner.

use async_trait::async_trait;
use kora_core::{
    error::KoraError,
    result::HandlerResult,
    traits::{CommandPlugin, Notifier},
};
use std::sync::Arc;
use tracing::warn;

pub struct ReportPlugin {
    notifier: Arc<dyn Notifier>,
}

impl ReportPlugin {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl CommandPlugin for ReportPlugin {
    fn name(&self) -> &str {
        "report"
    }

    fn description(&self) -> &str {
        "Send a message to the bot owner. Usage: report <message>"
    }

    async fn execute(&self, args: &str, sender_id: &str) -> Result<HandlerResult, KoraError> {
        let body = args.trim();
        if body.is_empty() {
            return Ok("🧘 Please provide a message to be sent to Admin".into());
        }

        let report = format!(
            "📩 |== Quick Message ==|\n\n\
             👨‍💻 Message From: {sender_id}\n\n\
             📝 |== Body ==|\n\
             {body}\n\n\
             📬 |==========|"
        );

        match self.notifier.notify_admin(&report).await {
            Ok(()) => Ok("✅ Your message has been sent to the admin successfully!".into()),
            Err(e) => {
                warn!("report from {sender_id} not delivered: {e}");
                Ok("⚠️ Failed to send your message to the admin. Please try again later.".into())
            }
        }
    }
}
