use serde::Serialize;
use thiserror::Error;

use crate::ai::extract::ExtractError;

#[derive(Debug, Error)]
pub enum LuminaError {
    /// Endpoint unreachable, connection reset, or request timed out
    #[error("Network error: {0}")]
    Transport(String),

    /// Non-success status carrying the server-provided message
    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("{0}")]
    QuotaExceeded(String),

    #[error("No content received from AI")]
    EmptyCompletion,

    #[error("Failed to parse AI response: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Spark not found: {0}")]
    NotFound(String),

    #[error("Invalid capture: {0}")]
    InvalidCapture(String),

    #[error("Captures from {0} are blocked in settings")]
    BlockedDomain(String),

    #[error("API key is required for direct mode. Add one in settings or set OPENAI_API_KEY.")]
    MissingCredential,

    #[error("Drafts are already being generated for {0}")]
    GenerationInProgress(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LuminaError {
    /// Whether the user should wait before retrying.
    pub fn is_quota(&self) -> bool {
        matches!(self, LuminaError::QuotaExceeded(_))
    }
}

impl From<reqwest::Error> for LuminaError {
    fn from(err: reqwest::Error) -> Self {
        LuminaError::Transport(err.to_string())
    }
}

// Surfaced verbatim to the UI as a message string
impl Serialize for LuminaError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LuminaError>;
