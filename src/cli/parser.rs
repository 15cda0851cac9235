//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::retrieval::DEFAULT_MAX_RESULTS;

/// Default catalog file, relative to the working directory.
pub const DEFAULT_CATALOG_PATH: &str = "course-catalog.json";

/// course-rag: ask questions about course materials.
///
/// Answers come from an LLM that may search lesson content and course
/// outlines before responding.
#[derive(Parser, Debug)]
#[command(name = "course-rag")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the course catalog JSON file.
    #[arg(short, long, env = "COURSE_RAG_CATALOG", default_value = DEFAULT_CATALOG_PATH, global = true)]
    pub catalog: PathBuf,

    /// Passages returned by one content search.
    #[arg(long, env = "COURSE_RAG_MAX_RESULTS", default_value_t = DEFAULT_MAX_RESULTS, global = true)]
    pub max_results: usize,

    /// Enable verbose output (debug logs on stderr).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask one question about the course materials.
    #[command(after_help = r#"Examples:
  course-rag ask "What is covered in lesson 1 of the MCP course?"
  course-rag ask "Give me the outline of the Chroma course" --provider groq
  course-rag ask "What is RAG?" --no-tools
  course-rag --format json ask "Compare lesson 1 and 2" | jq '.sources'
"#)]
    Ask {
        /// The question.
        query: String,

        /// LLM provider (anthropic, openai, groq).
        #[arg(long)]
        provider: Option<String>,

        /// Model identifier.
        #[arg(long)]
        model: Option<String>,

        /// Maximum sequential tool rounds.
        #[arg(long)]
        max_rounds: Option<usize>,

        /// Answer without offering tools to the model.
        #[arg(long)]
        no_tools: bool,
    },

    /// Interactive session: one question per line on stdin.
    ///
    /// Keeps a short window of previous exchanges as context.
    Chat {
        /// LLM provider (anthropic, openai, groq).
        #[arg(long)]
        provider: Option<String>,

        /// Model identifier.
        #[arg(long)]
        model: Option<String>,

        /// Maximum sequential tool rounds.
        #[arg(long)]
        max_rounds: Option<usize>,
    },

    /// Search lesson content directly (no LLM).
    #[command(after_help = r#"Examples:
  course-rag search "transport layer"
  course-rag search "clients" --course MCP --lesson 1
"#)]
    Search {
        /// Search query text.
        query: String,

        /// Course name (partial matches work).
        #[arg(long)]
        course: Option<String>,

        /// Lesson number.
        #[arg(long)]
        lesson: Option<u32>,
    },

    /// Show a course outline directly (no LLM).
    Outline {
        /// Course name (partial matches work).
        course: String,
    },

    /// List catalog courses.
    Courses,

    /// Write the default system prompt template for customization.
    InitPrompts {
        /// Target directory (default: ~/.config/course-rag/prompts).
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask_with_overrides() {
        let cli = Cli::try_parse_from([
            "course-rag",
            "ask",
            "What is MCP?",
            "--provider",
            "groq",
            "--max-rounds",
            "3",
            "--no-tools",
        ]);
        let Ok(cli) = cli else {
            unreachable!("ask should parse");
        };
        match cli.command {
            Commands::Ask {
                query,
                provider,
                max_rounds,
                no_tools,
                ..
            } => {
                assert_eq!(query, "What is MCP?");
                assert_eq!(provider.as_deref(), Some("groq"));
                assert_eq!(max_rounds, Some(3));
                assert!(no_tools);
            }
            other => unreachable!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let Ok(cli) = Cli::try_parse_from([
            "course-rag",
            "search",
            "clients",
            "--lesson",
            "1",
            "--catalog",
            "/tmp/catalog.json",
            "--format",
            "json",
        ]) else {
            unreachable!("search should parse");
        };
        assert_eq!(cli.catalog, PathBuf::from("/tmp/catalog.json"));
        assert_eq!(cli.format, "json");
        assert!(matches!(
            cli.command,
            Commands::Search {
                lesson: Some(1),
                course: None,
                ..
            }
        ));
    }

    #[test]
    fn test_outline_requires_course() {
        assert!(Cli::try_parse_from(["course-rag", "outline"]).is_err());
    }
}
