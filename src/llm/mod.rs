//! LLM integration for parley.
//!
//! Provides the unified AI client used by the flow orchestrator and the
//! report builder. All text generation in the engine goes through the
//! [`LlmProvider`] trait so tests can substitute a mock provider and the
//! rest of the crate stays transport-agnostic.
//!
//! ```ignore
//! use parley::llm::{UnifiedAiClient, Message, GenerationRequest, LlmProvider};
//!
//! let client = UnifiedAiClient::from_env()?;
//! let request = GenerationRequest::new(
//!     "anthropic/claude-opus-4.5",
//!     vec![
//!         Message::system("You are a debate panelist."),
//!         Message::user("Should AI replace teachers?"),
//!     ],
//! )
//! .with_temperature(0.7);
//! let response = client.generate(request).await?;
//! ```

pub mod unified;

pub use unified::{
    Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, UnifiedAiClient, Usage,
};
