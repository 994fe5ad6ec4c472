//! Webhook ingress: subscription handshake and page-event parsing.

use super::types::{MessagingEvent, WebhookEvent};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use chrono::Utc;
use kora_core::message::{Attachment, AttachmentType, IncomingMessage};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Shared state for webhook handlers.
#[derive(Clone)]
pub struct WebhookState {
    pub verify_token: String,
    pub tx: mpsc::Sender<IncomingMessage>,
}

/// Build the webhook router.
pub fn build_router(state: WebhookState) -> Router {
    Router::new()
        .route("/webhook", get(verify).post(receive))
        .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024)) // 1 MB max request body
        .with_state(state)
}

/// GET /webhook: echo `hub.challenge` when the verify token matches.
async fn verify(
    State(state): State<WebhookState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    let mode = params.get("hub.mode").map(String::as_str);
    let token = params.get("hub.verify_token").map(String::as_str);

    match (mode, token, params.get("hub.challenge")) {
        (Some("subscribe"), Some(token), Some(challenge))
            if !state.verify_token.is_empty() && token == state.verify_token =>
        {
            info!("webhook verified");
            (StatusCode::OK, challenge.clone())
        }
        _ => {
            warn!("webhook verification failed");
            (StatusCode::FORBIDDEN, "Verification failed".to_string())
        }
    }
}

/// POST /webhook: forward page messages. Always acknowledged so the
/// platform never retries because of internal failures.
async fn receive(State(state): State<WebhookState>, body: Bytes) -> (StatusCode, &'static str) {
    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(e) => e,
        Err(e) => {
            warn!("webhook: unparseable payload: {e}");
            return (StatusCode::OK, "EVENT_RECEIVED");
        }
    };

    if event.object != "page" {
        debug!("webhook: ignoring object '{}'", event.object);
        return (StatusCode::OK, "EVENT_RECEIVED");
    }

    for messaging in event.entry.into_iter().flat_map(|e| e.messaging) {
        let Some(incoming) = to_incoming(messaging) else {
            continue;
        };
        if state.tx.send(incoming).await.is_err() {
            warn!("webhook: gateway receiver dropped");
            break;
        }
    }

    (StatusCode::OK, "EVENT_RECEIVED")
}

/// Convert one messaging event; non-message events and echoes yield `None`.
pub(crate) fn to_incoming(event: MessagingEvent) -> Option<IncomingMessage> {
    let message = event.message?;
    if message.is_echo {
        return None;
    }

    let attachments = message
        .attachments
        .into_iter()
        .map(|a| {
            let file_type = AttachmentType::from_platform(&a.kind);
            Attachment {
                file_type,
                url: a.payload.and_then(|p| p.url),
                data: None,
                mime_type: (file_type == AttachmentType::Image).then(|| "image/jpeg".to_string()),
            }
        })
        .collect();

    Some(IncomingMessage {
        id: Uuid::new_v4(),
        channel: "messenger".to_string(),
        sender_id: event.sender.id,
        text: message.text.unwrap_or_default(),
        timestamp: Utc::now(),
        attachments,
    })
}
