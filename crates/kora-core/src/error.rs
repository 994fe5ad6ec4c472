use thiserror::Error;

/// Top-level error type for Kora.
#[derive(Debug, Error)]
pub enum KoraError {
    /// Error from the AI backend (including timeouts).
    #[error("provider error: {0}")]
    Provider(String),

    /// Error from a messaging channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// Attachment upload failed; no reference was obtained.
    #[error("upload error: {0}")]
    Upload(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Memory/storage error.
    #[error("memory error: {0}")]
    Memory(String),

    /// A command plugin failed while executing.
    #[error("plugin error: {0}")]
    Plugin(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
