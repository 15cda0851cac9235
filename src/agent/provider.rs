//! Pluggable LLM provider trait.
//!
//! Implementations translate the provider-agnostic [`ChatRequest`] into one
//! backend's wire format and normalize the reply into a
//! [`GeneratedResponse`]. This keeps the orchestrator decoupled from any
//! particular LLM vendor.

use async_trait::async_trait;
use serde_json::Value;

use super::message::{ChatMessage, ChatRequest, GeneratedResponse, ToolOutcome};
use super::tool::ToolDefinition;
use crate::error::AgentError;

/// Trait for LLM provider backends.
///
/// Implementations handle the transport layer (HTTP or SDK calls) for a
/// specific backend family while presenting a uniform interface to the
/// orchestrator.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., `"anthropic"`, `"openai"`).
    fn name(&self) -> &'static str;

    /// Executes one completion request.
    ///
    /// A refusal or an empty completion is a text response with empty text,
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiRequest`] on transport, authentication,
    /// rate-limit or HTTP status failures and
    /// [`AgentError::ResponseParse`] when the reply cannot be decoded.
    async fn generate(&self, request: &ChatRequest) -> Result<GeneratedResponse, AgentError>;

    /// Converts a generic tool descriptor into this backend's tool schema.
    fn convert_tool_definition(&self, tool: &ToolDefinition) -> Value;

    /// Packages tool outcomes as the message(s) this backend expects back.
    fn build_tool_result_messages(&self, outcomes: &[ToolOutcome]) -> Vec<ChatMessage>;
}
