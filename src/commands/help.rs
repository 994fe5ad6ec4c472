//! `help`: lists every registered command.

use async_trait::async_trait;
use kora_core::{error::KoraError, result::HandlerResult, traits::CommandPlugin};

const DESCRIPTION: &str = "Show the list of available commands.";

pub struct HelpPlugin {
    text: String,
}

impl HelpPlugin {
    /// Build the listing from a snapshot of the registry taken before `help`
    /// itself is registered.
    pub fn new(bot_name: &str, prefix: &str, mut commands: Vec<(String, String)>) -> Self {
        if !commands.iter().any(|(name, _)| name == "help") {
            commands.push(("help".to_string(), DESCRIPTION.to_string()));
        }
        commands.sort();

        let mut text = format!("📜 {bot_name} Command List\n\nHere are the available commands:\n\n");
        for (name, description) in &commands {
            text.push_str(&format!("📌 {prefix}{name}\n   📖 {description}\n"));
        }
        text.push_str(&format!(
            "\n💡 Type {prefix}command_name to use a command.\n   Example: {prefix}up to check the bot's status."
        ));
        Self { text }
    }
}

#[async_trait]
impl CommandPlugin for HelpPlugin {
    fn name(&self) -> &str {
        "help"
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    async fn execute(&self, _args: &str, _sender_id: &str) -> Result<HandlerResult, KoraError> {
        Ok(HandlerResult::PlainText(self.text.clone()))
    }
}
