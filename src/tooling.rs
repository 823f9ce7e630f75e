//! Tooling & Integration Layer
//!
//! Command-line surface over the browsing session: interactive browsing,
//! one-shot lookups, history management, and configuration scaffolding.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
