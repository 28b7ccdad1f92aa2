//! Command-line interface for parley.
//!
//! Provides commands for running automated debate sessions and inspecting
//! the built-in panel roles.

mod commands;

pub use commands::{parse_cli, run_with_cli, Cli};
