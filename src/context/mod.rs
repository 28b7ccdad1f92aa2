//! Context carryover: the round-iteration state machine.
//!
//! This is the engine's core. Validator points flow in from each round's
//! validation step, user decisions partition them into kept and removed
//! sets accumulated across iterations, and the result is folded into an
//! enhanced prompt plus restart configuration for the next round.
//!
//! State machine per debate thread:
//!
//! ```text
//! Uninitialized --process_*--> Active(iteration 1)
//! Active        --process_*--> Active(iteration += 1), history merged
//! Active --prepare_flow_restart--> RestartReady (manager stays Active;
//!                                  further interactions re-enter the merge)
//! ```
//!
//! Termination (final report) is the caller's decision; the manager has no
//! terminal state of its own.

pub mod manager;
pub mod point;
pub mod prompt;

pub use manager::{
    prepare_restart, ContextManager, ContextStats, FlowContext, FlowRestartConfig,
    InteractionInput, RestartMetadata, RestartOptions,
};
pub use point::{PointPriority, RawValidationResult, ValidatorPoint, ValidatorResponse};
pub use prompt::synthesize_prompt;
