//! parley: multi-agent debate engine with context carryover.
//!
//! A debate thread iterates: a question goes to a panel of agents, a
//! validator extracts atomic claims from their responses, the reviewer
//! keeps or removes each claim, and the accumulated decisions are folded
//! into an enhanced prompt that restarts the panel for the next round.
//!
//! The crate's core is the [`context`] module (accumulation, prompt
//! synthesis, restart configuration) and the [`round`] module
//! (advance-or-terminate reconciliation). The [`flow`] module executes
//! rounds against an LLM provider, [`agents`] defines the panel, and
//! [`report`] renders the terminal document.

// Core modules
pub mod agents;
pub mod cli;
pub mod context;
pub mod error;
pub mod flow;
pub mod llm;
pub mod report;
pub mod round;
pub mod session;

// Re-export commonly used error types
pub use error::{ContextError, LlmError, RoundError};
