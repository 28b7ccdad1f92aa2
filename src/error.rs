//! Error types for parley operations.
//!
//! Defines error types for the major subsystems:
//! - Context accumulation, export and restart preparation
//! - Round advancement and feedback reconciliation
//! - LLM API interactions

use thiserror::Error;

/// Errors that can occur during context operations.
#[derive(Debug, Error)]
pub enum ContextError {
    /// No context has been accumulated yet; an interaction must be
    /// processed before a restart can be prepared or an export produced.
    #[error("No flow context available: process an interaction first")]
    NoContext,

    #[error("Invalid interaction input: {0}")]
    InvalidInput(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while reconciling a round.
#[derive(Debug, Error)]
pub enum RoundError {
    /// No points were selected; nothing can be reconciled from an empty
    /// selection, for advancing and for report generation alike.
    #[error("No points selected: select at least one point before submitting")]
    EmptySelection,

    /// The configured round ceiling was hit. Distinct from invalid input so
    /// callers can surface a specific "max rounds reached" message.
    #[error("Maximum of {max} rounds reached (current round {current})")]
    MaxRoundsReached { current: u32, max: u32 },

    #[error("Invalid round state: {0}")]
    InvalidState(String),
}

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: PARLEY_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("Missing API base URL: PARLEY_API_BASE environment variable not set")]
    MissingApiBase,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
