use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An incoming message from a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Channel name (e.g. "messenger", "console").
    pub channel: String,
    /// Platform-specific user ID. Replies go back to this ID.
    pub sender_id: String,
    /// Message text content. Empty when the event only carries attachments.
    #[serde(default)]
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl IncomingMessage {
    /// Build a text-only message stamped with the current time.
    pub fn text(channel: &str, sender_id: &str, text: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.to_string(),
            sender_id: sender_id.to_string(),
            text: text.to_string(),
            timestamp: Utc::now(),
            attachments: Vec::new(),
        }
    }
}

/// An outgoing message to send back through a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub recipient_id: String,
    pub body: OutgoingBody,
}

/// What an outgoing message carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutgoingBody {
    /// Plain text, already within the platform length limit.
    Text(String),
    /// Opaque reference returned by a previous upload.
    Attachment(String),
}

impl OutgoingMessage {
    pub fn text(recipient_id: &str, text: impl Into<String>) -> Self {
        Self {
            recipient_id: recipient_id.to_string(),
            body: OutgoingBody::Text(text.into()),
        }
    }

    pub fn attachment(recipient_id: &str, reference: impl Into<String>) -> Self {
        Self {
            recipient_id: recipient_id.to_string(),
            body: OutgoingBody::Attachment(reference.into()),
        }
    }
}

/// A file attachment on a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub file_type: AttachmentType,
    pub url: Option<String>,
    /// Raw bytes when the transport delivered them inline.
    pub data: Option<Vec<u8>>,
    pub mime_type: Option<String>,
}

/// Supported attachment types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentType {
    Image,
    Audio,
    Video,
    File,
    Other,
}

impl AttachmentType {
    /// Map a platform attachment type string (e.g. Messenger's `"image"`).
    pub fn from_platform(kind: &str) -> Self {
        match kind {
            "image" => Self::Image,
            "audio" => Self::Audio,
            "video" => Self::Video,
            "file" => Self::File,
            _ => Self::Other,
        }
    }
}
