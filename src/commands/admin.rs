//! `admin`: owner-only panel.

use async_trait::async_trait;
use kora_core::{
    error::KoraError,
    result::{HandlerResult, StructuredMessage},
    traits::CommandPlugin,
};

pub const ADMIN_ONLY: &str = "🚫 This room is for the Bot owner only.";

pub struct AdminPlugin {
    admin_id: String,
    prefix: String,
}

impl AdminPlugin {
    pub fn new(admin_id: &str, prefix: &str) -> Self {
        Self {
            admin_id: admin_id.to_string(),
            prefix: prefix.to_string(),
        }
    }
}

#[async_trait]
impl CommandPlugin for AdminPlugin {
    fn name(&self) -> &str {
        "admin"
    }

    fn description(&self) -> &str {
        "Admin-only: the bot owner's control room."
    }

    async fn execute(&self, _args: &str, sender_id: &str) -> Result<HandlerResult, KoraError> {
        // No configured admin means nobody is.
        if self.admin_id.is_empty() || sender_id != self.admin_id {
            return Ok(HandlerResult::Structured(StructuredMessage::failure(
                ADMIN_ONLY,
            )));
        }

        let p = &self.prefix;
        Ok(HandlerResult::Structured(StructuredMessage::text(format!(
            "👑 Welcome, Admin!\n\
             This is your special command room.\n\n\
             🛠️ Admin Commands:\n\
             {p}admin - Show this admin panel\n\
             {p}up    - Uptime and database size\n\n\
             User reports ({p}report) and error alerts are delivered to this chat."
        ))))
    }
}
