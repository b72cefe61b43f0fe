//! Error types for the voice-chat gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the voice-chat gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or empty required field (utterance, user id, profile)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Language-model or TTS call failed; `details` carries the upstream message
    #[error("{message}")]
    CollaboratorFailure { message: String, details: String },

    /// Resource not found (session, voice)
    #[error("not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Language-model call failure
    pub fn llm(details: impl Into<String>) -> Self {
        Self::CollaboratorFailure {
            message: "language model request failed".to_string(),
            details: details.into(),
        }
    }

    /// Text-to-speech call failure
    pub fn tts(details: impl Into<String>) -> Self {
        Self::CollaboratorFailure {
            message: "speech synthesis failed".to_string(),
            details: details.into(),
        }
    }

    /// Whether this error originated in an external collaborator
    #[must_use]
    pub const fn is_collaborator_failure(&self) -> bool {
        matches!(self, Self::CollaboratorFailure { .. } | Self::Http(_))
    }
}
