//! Phase 1 contract tests: CLI parsing and command output shapes

mod output_contracts;
mod parse_help_parity;
mod support;
