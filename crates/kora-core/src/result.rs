//! The single result shape every plugin and chat turn produces.

/// Output of a command plugin or a chat turn, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResult {
    PlainText(String),
    Structured(StructuredMessage),
    /// Rendered in order.
    List(Vec<StructuredMessage>),
}

/// A typed piece of handler output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredMessage {
    /// `false` marks a handler-reported failure (delivered as error text).
    pub success: bool,
    pub payload: Payload,
}

/// Structured payload. Images always carry raw bytes, never an uploaded
/// reference: uploading belongs to the delivery pipeline.
#[derive(Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Image { data: Vec<u8>, mime_type: String },
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Image { data, mime_type } => f
                .debug_struct("Image")
                .field("bytes", &data.len())
                .field("mime_type", mime_type)
                .finish(),
        }
    }
}

impl StructuredMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            success: true,
            payload: Payload::Text(text.into()),
        }
    }

    /// A handler-reported failure, shown to the user as text.
    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: Payload::Text(text.into()),
        }
    }

    pub fn image(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            success: true,
            payload: Payload::Image {
                data,
                mime_type: mime_type.into(),
            },
        }
    }
}

impl From<String> for HandlerResult {
    fn from(text: String) -> Self {
        Self::PlainText(text)
    }
}

impl From<&str> for HandlerResult {
    fn from(text: &str) -> Self {
        Self::PlainText(text.to_string())
    }
}

impl HandlerResult {
    /// Text content of the result if it is text-only, for logging and tests.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::PlainText(text) => Some(text),
            Self::Structured(StructuredMessage {
                payload: Payload::Text(text),
                ..
            }) => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_text() {
        assert_eq!(HandlerResult::from("hi").as_text(), Some("hi"));
        assert_eq!(
            HandlerResult::Structured(StructuredMessage::failure("nope")).as_text(),
            Some("nope")
        );
        let img = HandlerResult::Structured(StructuredMessage::image(vec![1, 2], "image/png"));
        assert_eq!(img.as_text(), None);
    }

    #[test]
    fn test_image_debug_hides_bytes() {
        let msg = StructuredMessage::image(vec![0; 1024], "image/jpeg");
        let dbg = format!("{msg:?}");
        assert!(dbg.contains("1024"));
        assert!(dbg.contains("image/jpeg"));
    }
}
