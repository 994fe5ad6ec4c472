//! Conversation turns: the unit of per-user history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }
}

impl FromStr for Sender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "bot" => Ok(Self::Bot),
            other => Err(format!("unknown sender: {other}")),
        }
    }
}

/// What kind of content a turn records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    Command,
    Analysis,
    Error,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Command => "command",
            Self::Analysis => "analysis",
            Self::Error => "error",
        }
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "command" => Ok(Self::Command),
            "analysis" => Ok(Self::Analysis),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown message type: {other}")),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded message, user- or bot-authored. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub sender: Sender,
    pub message_type: MessageType,
    /// Free-form key/value data (e.g. `{"url": "..."}` for images).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl ConversationTurn {
    /// A turn authored by the user, stamped now.
    pub fn from_user(user_id: &str, message: &str, message_type: MessageType) -> Self {
        Self::new(user_id, message, Sender::User, message_type)
    }

    /// A turn authored by the bot, stamped now.
    pub fn from_bot(user_id: &str, message: &str, message_type: MessageType) -> Self {
        Self::new(user_id, message, Sender::Bot, message_type)
    }

    fn new(user_id: &str, message: &str, sender: Sender, message_type: MessageType) -> Self {
        Self {
            user_id: user_id.to_string(),
            timestamp: Utc::now(),
            message: message.to_string(),
            sender,
            message_type,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Render the turn the way it is shown to the AI backend.
    ///
    /// Image turns become a placeholder carrying the image URL (if known);
    /// everything else is the raw message text.
    pub fn render(&self) -> String {
        match self.message_type {
            MessageType::Image => {
                let url = self
                    .metadata
                    .as_ref()
                    .and_then(|m| m.get("url"))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if url.is_empty() {
                    "[Sent an image]".to_string()
                } else {
                    format!("[Sent an image: {url}]")
                }
            }
            _ => self.message.clone(),
        }
    }
}
