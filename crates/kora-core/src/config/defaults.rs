//! Default value functions used by serde for config deserialization.

pub fn default_name() -> String {
    "KORA AI".to_string()
}

pub fn default_data_dir() -> String {
    "~/.kora".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_true() -> bool {
    true
}

pub fn default_command_prefix() -> String {
    "/".to_string()
}

/// Messenger rejects text messages longer than 2000 characters.
pub fn default_max_message_len() -> usize {
    2000
}

pub fn default_seed_history() -> usize {
    10
}

pub fn default_db_path() -> String {
    "~/.kora/data/memory.db".to_string()
}

pub fn default_retention() -> usize {
    20
}

pub fn default_provider() -> String {
    "gemini".to_string()
}

pub fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

pub fn default_provider_timeout() -> u64 {
    60
}

pub fn default_graph_api_version() -> String {
    "v22.0".to_string()
}

pub fn default_webhook_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_webhook_port() -> u16 {
    3000
}

pub fn default_api_host() -> String {
    "127.0.0.1".to_string()
}

pub fn default_api_port() -> u16 {
    3001
}

pub fn default_image_command() -> String {
    "imagine".to_string()
}

pub fn default_image_api_url() -> String {
    "https://image.pollinations.ai/prompt/{prompt}".to_string()
}

pub fn default_plugin_timeout() -> u64 {
    30
}

pub fn default_dispatch_timeout() -> u64 {
    90
}
