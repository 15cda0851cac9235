//! LLM tool-calling engine for course questions.
//!
//! Provides a provider-agnostic orchestration loop that lets a model call
//! retrieval tools for a bounded number of rounds before answering. Backends
//! plug in through the [`LlmProvider`] trait.
//!
//! # Architecture
//!
//! ```text
//! User query → Orchestrator
//!   ├── BudgetPolicy (response-length ceiling from query intent)
//!   ├── LlmProvider::generate (Anthropic / OpenAI / Groq adapter)
//!   ├── up to K rounds:
//!   │   ├── ToolRegistry::dispatch for each requested tool
//!   │   └── follow-up generate (no tools on round K)
//!   └── final text; sources via ToolRegistry::last_sources
//! ```

pub mod budget;
pub mod client;
pub mod config;
pub mod history;
pub mod message;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod tool;

// Re-export key types
pub use budget::{Budget, BudgetPolicy, ResponseTier, TokenBudgets};
pub use client::create_provider;
pub use config::AgentConfig;
pub use history::SessionHistory;
pub use message::{
    BackendPayload, ChatMessage, ChatRequest, GeneratedResponse, Role, TokenUsage, ToolCall,
    ToolOutcome,
};
pub use orchestrator::Orchestrator;
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use registry::ToolRegistry;
pub use tool::{Source, Tool, ToolArguments, ToolDefinition};
