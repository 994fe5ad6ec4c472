use serde::{Deserialize, Serialize};

/// Channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelConfig {
    pub messenger: Option<MessengerConfig>,
}

/// Facebook Messenger (Graph API) channel config.
///
/// Inbound events arrive on the webhook server bound to `host:port`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessengerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub page_access_token: String,
    /// Token echoed back during the webhook subscription handshake.
    #[serde(default)]
    pub verify_token: String,
    #[serde(default = "super::defaults::default_graph_api_version")]
    pub graph_api_version: String,
    #[serde(default = "super::defaults::default_webhook_host")]
    pub host: String,
    #[serde(default = "super::defaults::default_webhook_port")]
    pub port: u16,
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            page_access_token: String::new(),
            verify_token: String::new(),
            graph_api_version: super::defaults::default_graph_api_version(),
            host: super::defaults::default_webhook_host(),
            port: super::defaults::default_webhook_port(),
        }
    }
}
