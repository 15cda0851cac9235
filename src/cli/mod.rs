//! CLI layer for course-rag.
//!
//! Provides the command-line interface using clap: LLM-backed `ask` and
//! `chat`, plus offline `search`, `outline`, `courses` and `init-prompts`.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::{debug_enabled, execute};
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
