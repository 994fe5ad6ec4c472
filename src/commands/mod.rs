//! Command plugins and the registry that dispatches to them.
//!
//! Plugins are registered by name at startup. The dispatcher is total: every
//! call produces a `HandlerResult`, whatever the plugin does.

mod admin;
mod help;
mod imagine;
mod report;
mod up;

#[cfg(test)]
mod tests;

pub use admin::AdminPlugin;
pub use help::HelpPlugin;
pub use imagine::ImaginePlugin;
pub use report::ReportPlugin;
pub use up::UpPlugin;

use kora_core::{result::HandlerResult, traits::CommandPlugin};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Reply when a plugin fails, panics, or runs past the dispatch timeout.
pub const COMMAND_FAILED: &str =
    "⚠️ Something went wrong while running that command. Please try again later.";

/// Name → plugin map, matched case-insensitively.
pub struct CommandRegistry {
    plugins: BTreeMap<String, Arc<dyn CommandPlugin>>,
    prefix: String,
    timeout: Duration,
}

impl CommandRegistry {
    pub fn new(prefix: &str, timeout: Duration) -> Self {
        Self {
            plugins: BTreeMap::new(),
            prefix: prefix.to_string(),
            timeout,
        }
    }

    /// Register a plugin under its lowercased name. A later registration
    /// with the same name replaces the earlier one.
    pub fn register(&mut self, plugin: impl CommandPlugin + 'static) {
        let name = plugin.name().to_lowercase();
        if self.plugins.insert(name.clone(), Arc::new(plugin)).is_some() {
            warn!("command '{name}' registered twice; keeping the last one");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(&name.to_lowercase())
    }

    /// `(name, description)` pairs sorted by name.
    pub fn descriptions(&self) -> Vec<(String, String)> {
        self.plugins
            .iter()
            .map(|(name, plugin)| (name.clone(), plugin.description().to_string()))
            .collect()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Run a command. Never fails: unknown names, plugin errors, panics and
    /// timeouts all become a plain-text reply.
    pub async fn dispatch(&self, name: &str, args: &str, sender_id: &str) -> HandlerResult {
        let key = name.to_lowercase();
        let Some(plugin) = self.plugins.get(&key).cloned() else {
            debug!("unknown command '{name}' from {sender_id}");
            return HandlerResult::PlainText(format!(
                "❓ Command \"{name}\" not found. Type {}help to see the available commands.",
                self.prefix
            ));
        };

        let args = args.to_string();
        let sender = sender_id.to_string();
        let mut task = tokio::spawn(async move { plugin.execute(&args, &sender).await });

        match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(Ok(Ok(result))) => result,
            Ok(Ok(Err(e))) => {
                warn!("command '{key}' failed for {sender_id}: {e}");
                HandlerResult::PlainText(COMMAND_FAILED.to_string())
            }
            Ok(Err(join_err)) => {
                error!("command '{key}' panicked for {sender_id}: {join_err}");
                HandlerResult::PlainText(COMMAND_FAILED.to_string())
            }
            Err(_) => {
                task.abort();
                warn!(
                    "command '{key}' timed out after {}s for {sender_id}",
                    self.timeout.as_secs()
                );
                HandlerResult::PlainText(COMMAND_FAILED.to_string())
            }
        }
    }
}
