//! `up`: name, version, uptime, and database size.

use async_trait::async_trait;
use kora_core::{error::KoraError, result::HandlerResult, traits::CommandPlugin};
use kora_memory::Store;
use std::time::{Duration, Instant};

pub struct UpPlugin {
    bot_name: String,
    started: Instant,
    store: Option<Store>,
}

impl UpPlugin {
    pub fn new(bot_name: &str, started: Instant, store: Option<Store>) -> Self {
        Self {
            bot_name: bot_name.to_string(),
            started,
            store,
        }
    }
}

#[async_trait]
impl CommandPlugin for UpPlugin {
    fn name(&self) -> &str {
        "up"
    }

    fn description(&self) -> &str {
        "Show how long the bot has been running."
    }

    async fn execute(&self, _args: &str, _sender_id: &str) -> Result<HandlerResult, KoraError> {
        let mut text = format!(
            "🤖 {} Uptime\n\n\
             Version: v{}\n\
             ⏱️ Uptime: {}",
            self.bot_name,
            env!("CARGO_PKG_VERSION"),
            format_duration(self.started.elapsed()),
        );

        if let Some(store) = &self.store {
            let db_size = store
                .db_size()
                .await
                .map(format_bytes)
                .unwrap_or_else(|_| "unknown".to_string());
            text.push_str(&format!("\n💾 Database: {db_size}"));
        }

        Ok(HandlerResult::PlainText(text))
    }
}

/// `Nd Nh Nm Ns`.
pub(super) fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{days}d {hours}h {minutes}m {seconds}s")
}

/// Format bytes into a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
