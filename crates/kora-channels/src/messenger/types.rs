//! Graph API wire types.

use serde::Deserialize;

/// Body of a webhook POST.
#[derive(Debug, Deserialize)]
pub(crate) struct WebhookEvent {
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WebhookEntry {
    #[serde(default)]
    pub messaging: Vec<MessagingEvent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagingEvent {
    pub sender: Participant,
    pub message: Option<FbMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Participant {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FbMessage {
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Vec<FbAttachment>,
    /// Set on copies of the page's own outgoing messages.
    #[serde(default)]
    pub is_echo: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FbAttachment {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: Option<FbAttachmentPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FbAttachmentPayload {
    pub url: Option<String>,
}

/// Response of `me/message_attachments`.
#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    pub attachment_id: Option<String>,
}

/// Graph API error envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct GraphErrorResponse {
    pub error: GraphError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: i64,
}
