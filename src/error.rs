//! Error types for course-rag.
//!
//! Each layer has its own error enum; [`Error`] unifies them for the CLI
//! and other callers that cross layers.

use thiserror::Error;

/// Convenience result alias using the crate-wide [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Agent, provider, or tool failure.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Course catalog could not be loaded.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// CLI command failure.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Raw I/O failure (stdin/stdout in the CLI).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the agent system: configuration, providers, tools.
#[derive(Debug, Error)]
pub enum AgentError {
    /// No API key configured for the selected provider.
    #[error("no API key configured for provider '{provider}'")]
    ApiKeyMissing {
        /// Provider the key was looked up for.
        provider: String,
    },

    /// The configured provider name has no adapter.
    #[error("unsupported LLM provider: {name}")]
    UnsupportedProvider {
        /// Requested provider name.
        name: String,
    },

    /// Transport, authentication, rate-limit, or HTTP status failure.
    #[error("API request failed{}: {message}", status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    ApiRequest {
        /// Error description.
        message: String,
        /// HTTP status code, when the server answered.
        status: Option<u16>,
    },

    /// The backend answered with a body that could not be decoded.
    #[error("failed to parse LLM response: {message}")]
    ResponseParse {
        /// Parse error description.
        message: String,
        /// Offending content (possibly truncated).
        content: String,
    },

    /// A tool raised while executing.
    #[error("tool '{name}' failed: {message}")]
    ToolExecution {
        /// Tool name.
        name: String,
        /// Error description.
        message: String,
    },

    /// A tool could not be registered (setup-time configuration error).
    #[error("tool registration failed: {message}")]
    ToolRegistration {
        /// Error description.
        message: String,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {message}")]
    Config {
        /// Error description.
        message: String,
    },
}

/// Errors loading the in-memory course catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog file could not be read.
    #[error("failed to read catalog {path}: {source}")]
    Io {
        /// Catalog path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Catalog file is not valid catalog JSON.
    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        /// Catalog path.
        path: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// Errors raised by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command could not complete.
    #[error("{0}")]
    ExecutionFailed(String),

    /// Output could not be rendered in the requested format.
    #[error("output formatting failed: {0}")]
    OutputFormat(String),
}
