mod channels;
mod defaults;
mod prompts;
mod providers;

#[cfg(test)]
mod tests;

pub use channels::*;
pub use prompts::*;
pub use providers::*;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::KoraError;
use defaults::*;

/// Top-level Kora configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub kora: KoraConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub intent: IntentConfig,
    #[serde(default)]
    pub plugins: PluginsConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KoraConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for KoraConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// Routing and delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Messages starting with this prefix are command invocations.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    /// The single platform user ID allowed to run admin-only commands.
    /// Also receives error reports. Empty = no admin.
    #[serde(default)]
    pub admin_id: String,
    /// Platform maximum characters per text message.
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,
    /// Stored turns used to seed a new chat session.
    #[serde(default = "default_seed_history")]
    pub seed_history: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            command_prefix: default_command_prefix(),
            admin_id: String::new(),
            max_message_len: default_max_message_len(),
            seed_history: default_seed_history(),
        }
    }
}

/// Memory config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// Turns kept per user; older ones are dropped first.
    #[serde(default = "default_retention")]
    pub retention: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            retention: default_retention(),
        }
    }
}

/// Free-text intent classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Command invoked when a message is classified as an image request.
    #[serde(default = "default_image_command")]
    pub image_command: String,
    /// Additional labeled training examples, appended to the built-in set.
    #[serde(default)]
    pub extra_examples: Vec<IntentExample>,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            image_command: default_image_command(),
            extra_examples: Vec::new(),
        }
    }
}

/// One labeled training sentence for the intent classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentExample {
    pub text: String,
    pub label: String,
}

/// Command plugin settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginsConfig {
    /// Image generation endpoint. `{prompt}` is replaced by the URL-encoded prompt.
    #[serde(default = "default_image_api_url")]
    pub image_api_url: String,
    /// Timeout applied to outbound HTTP calls made by plugins.
    #[serde(default = "default_plugin_timeout")]
    pub timeout_secs: u64,
    /// Upper bound on a whole plugin invocation, enforced by the dispatcher.
    #[serde(default = "default_dispatch_timeout")]
    pub dispatch_timeout_secs: u64,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            image_api_url: default_image_api_url(),
            timeout_secs: default_plugin_timeout(),
            dispatch_timeout_secs: default_dispatch_timeout(),
        }
    }
}

/// Plain HTTP query endpoint (`GET /api?query=...`), off by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Bearer token for API authentication. Empty = no auth (for local-only use).
    #[serde(default)]
    pub api_key: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_api_host(),
            port: default_api_port(),
            api_key: String::new(),
        }
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file, then apply environment overrides.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, KoraError> {
    let path = Path::new(path);
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path).map_err(|e| {
            KoraError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str::<Config>(&content)
            .map_err(|e| KoraError::Config(format!("failed to parse config: {}", e)))?
    } else {
        info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        Config::default()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Overlay secrets and deployment settings from the environment.
///
/// `lookup` returns the value of a variable, if set. Empty values are ignored.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(key) = get("GEMINI_API_KEY") {
        config
            .provider
            .gemini
            .get_or_insert_with(GeminiConfig::default)
            .api_key = key;
    }
    if let Some(token) = get("PAGE_ACCESS_TOKEN") {
        let messenger = config
            .channel
            .messenger
            .get_or_insert_with(MessengerConfig::default);
        messenger.page_access_token = token;
        messenger.enabled = true;
    }
    if let Some(token) = get("VERIFY_TOKEN") {
        config
            .channel
            .messenger
            .get_or_insert_with(MessengerConfig::default)
            .verify_token = token;
    }
    if let Some(admin) = get("ADMIN_ID") {
        config.chat.admin_id = admin;
    }
    if let Some(prefix) = get("PREFIX") {
        config.chat.command_prefix = prefix;
    }
}
