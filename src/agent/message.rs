//! Provider-agnostic message and response types for LLM communication.
//!
//! These types decouple the orchestrator from any specific LLM wire format.
//! Adapters normalize their replies into [`GeneratedResponse`] and carry the
//! backend's own shape in the [`BackendPayload`] tagged union, so the
//! orchestrator can replay an assistant turn without inspecting it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::tool::{ToolArguments, ToolDefinition};

/// Role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User input (also carries content-block tool results).
    User,
    /// Assistant response.
    Assistant,
    /// Choice-style tool result.
    Tool,
}

/// A structured content block (content-block wire format).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text {
        /// Text content.
        text: String,
    },
    /// A tool invocation requested by the assistant.
    ToolUse {
        /// Backend-assigned call id.
        id: String,
        /// Tool name.
        name: String,
        /// Call arguments.
        input: ToolArguments,
    },
    /// The result of a tool invocation, sent back by the user turn.
    ToolResult {
        /// Id of the call this result answers.
        tool_use_id: String,
        /// Tool output.
        content: String,
    },
}

/// Message content: a plain string or structured blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text.
    Text(String),
    /// Structured blocks.
    Blocks(Vec<ContentBlock>),
}

impl MessageContent {
    /// Concatenated text of the content (text blocks only).
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

/// A single conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Message content.
    pub content: MessageContent,
    /// Tool calls requested by a choice-style assistant turn.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Tool call ID a choice-style tool message responds to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Backend-assigned identifier, echoed back verbatim with the result.
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// Decoded call arguments.
    pub arguments: ToolArguments,
}

/// The string result of one executed tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// ID of the tool call this result corresponds to.
    pub tool_call_id: String,
    /// Tool output (errors are encoded as readable text).
    pub content: String,
}

/// A completion request (provider-agnostic).
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// System instructions.
    pub system_prompt: String,
    /// Ordered conversation messages.
    pub messages: Vec<ChatMessage>,
    /// Tools available to the model; empty means tools are disabled.
    pub tools: Vec<ToolDefinition>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
}

/// Token usage statistics from a completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u32,
    /// Tokens generated in the completion.
    pub completion_tokens: u32,
}

/// The backend's native reply shape, captured once at normalization time.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendPayload {
    /// Content-block reply (text and `tool_use` blocks).
    ContentBlocks {
        /// Reply blocks in backend order.
        blocks: Vec<ContentBlock>,
        /// Backend stop reason.
        stop_reason: Option<String>,
    },
    /// Choice/message reply.
    Choice {
        /// Message text, if any.
        content: Option<String>,
        /// Tool calls on the message.
        tool_calls: Vec<ToolCall>,
        /// Backend finish reason.
        finish_reason: Option<String>,
    },
}

impl BackendPayload {
    /// Rebuilds the assistant turn in the shape this backend expects back.
    #[must_use]
    pub fn assistant_message(&self) -> ChatMessage {
        match self {
            Self::ContentBlocks { blocks, .. } => ChatMessage {
                role: Role::Assistant,
                content: MessageContent::Blocks(blocks.clone()),
                tool_calls: Vec::new(),
                tool_call_id: None,
            },
            Self::Choice {
                content,
                tool_calls,
                ..
            } => ChatMessage {
                role: Role::Assistant,
                content: MessageContent::Text(content.clone().unwrap_or_default()),
                tool_calls: tool_calls.clone(),
                tool_call_id: None,
            },
        }
    }
}

/// A normalized completion.
///
/// Construct through [`GeneratedResponse::text`] or
/// [`GeneratedResponse::tool_use`]; they guarantee that tool execution is
/// required exactly when `tool_calls` is non-empty and that `text` is empty
/// in that case.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedResponse {
    text: String,
    tool_calls: Vec<ToolCall>,
    raw: BackendPayload,
    usage: TokenUsage,
}

impl GeneratedResponse {
    /// A final text answer (possibly empty, e.g. a refusal).
    #[must_use]
    pub fn text(text: impl Into<String>, raw: BackendPayload, usage: TokenUsage) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
            raw,
            usage,
        }
    }

    /// A request to execute tools. An empty `tool_calls` yields an empty
    /// text response instead.
    #[must_use]
    pub const fn tool_use(tool_calls: Vec<ToolCall>, raw: BackendPayload, usage: TokenUsage) -> Self {
        Self {
            text: String::new(),
            tool_calls,
            raw,
            usage,
        }
    }

    /// Whether the model asked for tool execution.
    #[must_use]
    pub const fn requires_tool_execution(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Answer text (empty when tools are requested).
    #[must_use]
    pub fn content(&self) -> &str {
        &self.text
    }

    /// Requested tool calls, in backend order.
    #[must_use]
    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.tool_calls
    }

    /// Backend-native reply shape.
    #[must_use]
    pub const fn raw(&self) -> &BackendPayload {
        &self.raw
    }

    /// Token usage for this call.
    #[must_use]
    pub const fn usage(&self) -> TokenUsage {
        self.usage
    }

    /// Consumes the response, returning its text.
    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Creates a user message.
#[must_use]
pub fn user_message(content: &str) -> ChatMessage {
    ChatMessage {
        role: Role::User,
        content: MessageContent::Text(content.to_string()),
        tool_calls: Vec::new(),
        tool_call_id: None,
    }
}

/// Creates a choice-style tool result message.
#[must_use]
pub fn tool_message(tool_call_id: &str, content: &str) -> ChatMessage {
    ChatMessage {
        role: Role::Tool,
        content: MessageContent::Text(content.to_string()),
        tool_calls: Vec::new(),
        tool_call_id: Some(tool_call_id.to_string()),
    }
}

/// Creates a user message carrying content-block tool results.
#[must_use]
pub fn tool_results_message(outcomes: &[ToolOutcome]) -> ChatMessage {
    ChatMessage {
        role: Role::User,
        content: MessageContent::Blocks(
            outcomes
                .iter()
                .map(|o| ContentBlock::ToolResult {
                    tool_use_id: o.tool_call_id.clone(),
                    content: o.content.clone(),
                })
                .collect(),
        ),
        tool_calls: Vec::new(),
        tool_call_id: None,
    }
}

/// Parses a JSON argument string into a tool argument map.
///
/// An empty string is an empty map; any non-object JSON is rejected.
pub fn parse_arguments(raw: &str) -> Result<ToolArguments, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(ToolArguments::new());
    }
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(ToolArguments::new()),
        other => serde_json::from_value(other),
    }
}
