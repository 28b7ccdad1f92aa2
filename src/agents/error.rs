//! Error types for the agent layer.

use thiserror::Error;

/// Errors that can occur during agent operations.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Error from the LLM provider.
    #[error("LLM error: {0}")]
    LlmError(String),

    /// Error parsing LLM response.
    #[error("Failed to parse LLM response: {0}")]
    ResponseParseError(String),

    /// Agent not found in the roster.
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    /// Channel communication error.
    #[error("Channel communication failed: {0}")]
    ChannelError(String),

    /// Configuration error.
    #[error("Agent configuration error: {0}")]
    ConfigurationError(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<crate::error::LlmError> for AgentError {
    fn from(err: crate::error::LlmError) -> Self {
        AgentError::LlmError(err.to_string())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for AgentError {
    fn from(err: tokio::sync::mpsc::error::SendError<T>) -> Self {
        AgentError::ChannelError(format!("Failed to send on channel: {}", err))
    }
}

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;
