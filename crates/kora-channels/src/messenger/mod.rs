//! Facebook Messenger channel over the Graph API.
//!
//! Inbound page events arrive on an `axum` webhook server; replies go out
//! through `me/messages`, binary content through `me/message_attachments`.
//! Docs: <https://developers.facebook.com/docs/messenger-platform>

mod send;
pub(crate) mod types;
mod webhook;


pub use webhook::{build_router, WebhookState};

use async_trait::async_trait;
use kora_core::{
    config::MessengerConfig,
    error::KoraError,
    message::{Attachment, IncomingMessage, OutgoingBody, OutgoingMessage},
    traits::Channel,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tracing::{error, info};

const GRAPH_BASE_URL: &str = "https://graph.facebook.com";

/// Messenger channel: Graph API client plus webhook ingress.
pub struct MessengerChannel {
    config: MessengerConfig,
    client: reqwest::Client,
    base_url: String,
    shutdown: Arc<Notify>,
}

impl MessengerChannel {
    /// Create a new Messenger channel from config.
    pub fn new(config: MessengerConfig) -> Result<Self, KoraError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| KoraError::Channel(format!("messenger: failed to build client: {e}")))?;
        let base_url = format!("{GRAPH_BASE_URL}/{}", config.graph_api_version);
        Ok(Self {
            config,
            client,
            base_url,
            shutdown: Arc::new(Notify::new()),
        })
    }

    /// Point Graph API calls at a different root (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Channel for MessengerChannel {
    fn name(&self) -> &str {
        "messenger"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, KoraError> {
        let (tx, rx) = mpsc::channel(64);
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| KoraError::Channel(format!("webhook failed to bind to {addr}: {e}")))?;

        let app = build_router(WebhookState {
            verify_token: self.config.verify_token.clone(),
            tx,
        });
        let shutdown = self.shutdown.clone();

        info!("Messenger webhook listening on {addr}");

        tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.notified().await })
                .await;
            if let Err(e) = served {
                error!("webhook server error: {e}");
            }
        });

        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), KoraError> {
        match &message.body {
            OutgoingBody::Text(text) => self.send_text(&message.recipient_id, text).await,
            OutgoingBody::Attachment(reference) => {
                self.send_attachment(&message.recipient_id, reference).await
            }
        }
    }

    async fn upload(&self, data: &[u8], mime_type: &str) -> Result<String, KoraError> {
        self.upload_attachment(data, mime_type).await
    }

    async fn fetch_attachment(&self, attachment: &Attachment) -> Result<Vec<u8>, KoraError> {
        if let Some(data) = &attachment.data {
            return Ok(data.clone());
        }
        let url = attachment
            .url
            .as_deref()
            .ok_or_else(|| KoraError::Channel("attachment has neither data nor url".into()))?;
        self.download(url).await
    }

    async fn stop(&self) -> Result<(), KoraError> {
        self.shutdown.notify_one();
        info!("Messenger channel stopped");
        Ok(())
    }
}
