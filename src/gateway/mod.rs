//! Gateway: the event loop connecting the channel, the command registry,
//! the chat backend and conversation memory.

mod delivery;
mod intent;
mod intent_data;
mod notify;
mod pipeline;
mod routing;
mod sessions;


pub use notify::AdminNotifier;

use delivery::Delivery;
use intent::IntentClassifier;
use sessions::ChatSessionCache;

use crate::commands::CommandRegistry;
use kora_core::{
    config::{Config, Prompts},
    message::IncomingMessage,
    traits::{Channel, Notifier, Provider},
    turn::MessageType,
};
use kora_memory::Store;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Reply when routing fails unexpectedly.
pub const GENERIC_APOLOGY: &str = "😔 Sorry, something went wrong on my side. Please try again.";

/// Messages held per sender while one is in flight. Extra ones are dropped.
pub const MAX_BUFFERED_PER_SENDER: usize = 16;

/// The central gateway that routes inbound messages to handlers.
pub struct Gateway {
    pub(super) channel: Arc<dyn Channel>,
    pub(super) store: Store,
    pub(super) sessions: ChatSessionCache,
    pub(super) registry: Arc<CommandRegistry>,
    /// `None` when intent routing is disabled or failed to train.
    pub(super) classifier: Option<IntentClassifier>,
    pub(super) notifier: Arc<dyn Notifier>,
    pub(super) delivery: Delivery,
    pub(super) image_command: String,
    /// Senders with a message in flight. Later messages are buffered here.
    pub(super) active_senders: Mutex<HashMap<String, VecDeque<IncomingMessage>>>,
}

impl Gateway {
    pub fn new(
        config: &Config,
        prompts: Prompts,
        channel: Arc<dyn Channel>,
        provider: Arc<dyn Provider>,
        store: Store,
        registry: Arc<CommandRegistry>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let classifier = if config.intent.enabled {
            match IntentClassifier::from_config(&config.intent) {
                Ok(classifier) => {
                    if !classifier.labels().iter().any(|l| l == intent::GENERATE_IMAGE) {
                        warn!("intent training data has no '{}' label", intent::GENERATE_IMAGE);
                    }
                    Some(classifier)
                }
                Err(e) => {
                    warn!("intent classifier disabled: {e}");
                    None
                }
            }
        } else {
            None
        };

        Self {
            sessions: ChatSessionCache::new(
                provider,
                store.clone(),
                prompts,
                config.chat.seed_history,
            ),
            delivery: Delivery::new(channel.clone(), store.clone(), config.chat.max_message_len),
            channel,
            store,
            registry,
            classifier,
            notifier,
            image_command: config.intent.image_command.to_lowercase(),
            active_senders: Mutex::new(HashMap::new()),
        }
    }

    /// Run the main event loop until the channel closes or Ctrl-C.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        let mut rx = self
            .channel
            .start()
            .await
            .map_err(|e| {
                anyhow::anyhow!("failed to start channel {}: {e}", self.channel.name())
            })?;

        info!(
            "Kora gateway running | channel: {} | commands: {} | intent routing: {}",
            self.channel.name(),
            self.registry.descriptions().len(),
            if self.classifier.is_some() { "on" } else { "off" },
        );

        loop {
            tokio::select! {
                incoming = rx.recv() => match incoming {
                    Some(incoming) => {
                        let gw = self.clone();
                        tokio::spawn(async move {
                            gw.dispatch_message(incoming).await;
                        });
                    }
                    None => {
                        info!("channel {} closed", self.channel.name());
                        break;
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        info!("Shutting down...");
        if let Err(e) = self.channel.stop().await {
            warn!("failed to stop channel {}: {e}", self.channel.name());
        }
        info!("Shutdown complete.");
        Ok(())
    }

    /// Dispatch a message: buffer it if the sender is busy, otherwise process
    /// it and then drain whatever arrived meanwhile, in order.
    pub async fn dispatch_message(self: Arc<Self>, incoming: IncomingMessage) {
        let sender_key = format!("{}:{}", incoming.channel, incoming.sender_id);

        {
            let mut active = self.active_senders.lock().await;
            if let Some(buffer) = active.get_mut(&sender_key) {
                if buffer.len() >= MAX_BUFFERED_PER_SENDER {
                    warn!(
                        "dropping message from {sender_key}: {} already buffered",
                        buffer.len()
                    );
                    return;
                }
                buffer.push_back(incoming);
                info!("buffered message from {sender_key} (previous one in progress)");
                return;
            }
            active.insert(sender_key.clone(), VecDeque::new());
        }

        self.handle_message(incoming).await;

        loop {
            let next = {
                let mut active = self.active_senders.lock().await;
                let next = active.get_mut(&sender_key).and_then(VecDeque::pop_front);
                if next.is_none() {
                    active.remove(&sender_key);
                }
                next
            };

            match next {
                Some(buffered) => {
                    info!("processing buffered message from {sender_key}");
                    self.handle_message(buffered).await;
                }
                None => break,
            }
        }
    }

    /// Handle one message end to end. Never fails: routing errors and panics
    /// are logged, reported to the admin, and answered with an apology.
    pub async fn handle_message(self: &Arc<Self>, incoming: IncomingMessage) {
        let sender = incoming.sender_id.clone();
        let gw = self.clone();
        let outcome = tokio::spawn(async move { gw.route(&incoming).await }).await;

        let failure = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(join_err) => format!("handler panicked: {join_err}"),
        };

        error!("failed to handle message from {sender}: {failure}");
        self.report(&format!("🚨 Error while handling a message from {sender}: {failure}"))
            .await;
        self.delivery
            .send_text(&sender, GENERIC_APOLOGY, MessageType::Error)
            .await;
    }

    /// Best-effort admin notice.
    pub(super) async fn report(&self, text: &str) {
        if let Err(e) = self.notifier.notify_admin(text).await {
            warn!("admin notification failed: {e}");
        }
    }
}
