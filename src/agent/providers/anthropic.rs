//! Anthropic provider implementation over the Messages API.
//!
//! Content-block backend: assistant turns are lists of `text` and
//! `tool_use` blocks, and tool results go back as `tool_result` blocks in a
//! single user message.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::agent::config::{ANTHROPIC_BASE_URL, AgentConfig};
use crate::agent::message::{
    BackendPayload, ChatMessage, ChatRequest, ContentBlock, GeneratedResponse, MessageContent,
    Role, TokenUsage, ToolCall, ToolOutcome, tool_results_message,
};
use crate::agent::provider::LlmProvider;
use crate::agent::tool::{ToolArguments, ToolDefinition};
use crate::error::AgentError;

/// Anthropic API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";
/// Stop reason signalling pending tool calls.
const TOOL_USE_STOP_REASON: &str = "tool_use";
/// Longest body excerpt kept in parse errors.
const MAX_ERROR_EXCERPT: usize = 500;

/// Anthropic Messages API provider.
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicProvider {
    /// Creates a new provider from agent configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::Config {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| ANTHROPIC_BASE_URL.to_string()),
        })
    }

    /// Builds the messages endpoint URL.
    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }

    /// Converts our message type to the Messages API shape.
    fn convert_message(msg: &ChatMessage) -> WireMessage {
        match msg.role {
            Role::Assistant => WireMessage {
                role: "assistant",
                content: msg.content.clone(),
            },
            Role::User => WireMessage {
                role: "user",
                content: msg.content.clone(),
            },
            // Choice-style tool results are re-expressed as result blocks.
            Role::Tool => WireMessage {
                role: "user",
                content: MessageContent::Blocks(vec![ContentBlock::ToolResult {
                    tool_use_id: msg.tool_call_id.clone().unwrap_or_default(),
                    content: msg.content.as_text(),
                }]),
            },
        }
    }

    /// Builds a Messages API request body from our generic request.
    fn build_request<'a>(&'a self, request: &'a ChatRequest) -> MessagesRequest<'a> {
        let tools: Vec<Value> = request
            .tools
            .iter()
            .map(|t| self.convert_tool_definition(t))
            .collect();
        let tool_choice = (!tools.is_empty()).then(|| json!({"type": "auto"}));

        MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: &request.system_prompt,
            messages: request.messages.iter().map(Self::convert_message).collect(),
            tools,
            tool_choice,
        }
    }

    /// Normalizes a decoded Messages API reply.
    fn normalize(response: MessagesResponse) -> GeneratedResponse {
        let blocks: Vec<ContentBlock> = response
            .content
            .into_iter()
            .filter_map(ResponseBlock::into_content_block)
            .collect();
        let usage = response.usage.unwrap_or_default().into();

        if response.stop_reason.as_deref() == Some(TOOL_USE_STOP_REASON) {
            let tool_calls: Vec<ToolCall> = blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::ToolUse { id, name, input } => Some(ToolCall {
                        id: id.clone(),
                        name: name.clone(),
                        arguments: input.clone(),
                    }),
                    _ => None,
                })
                .collect();

            if !tool_calls.is_empty() {
                let raw = BackendPayload::ContentBlocks {
                    blocks,
                    stop_reason: response.stop_reason,
                };
                return GeneratedResponse::tool_use(tool_calls, raw, usage);
            }
        }

        let text = MessageContent::Blocks(blocks.clone()).as_text();
        let raw = BackendPayload::ContentBlocks {
            blocks,
            stop_reason: response.stop_reason,
        };
        GeneratedResponse::text(text, raw, usage)
    }

    /// Decodes a reply body.
    fn parse_body(body: &str) -> Result<GeneratedResponse, AgentError> {
        serde_json::from_str::<MessagesResponse>(body)
            .map(Self::normalize)
            .map_err(|e| AgentError::ResponseParse {
                message: e.to_string(),
                content: excerpt(body),
            })
    }
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn generate(&self, request: &ChatRequest) -> Result<GeneratedResponse, AgentError> {
        let body = self.build_request(request);
        debug!(
            model = %self.model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            max_tokens = body.max_tokens,
            "sending messages request"
        );

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "messages request failed");
                AgentError::ApiRequest {
                    message: if e.is_timeout() {
                        format!("request timed out: {e}")
                    } else {
                        e.to_string()
                    },
                    status: e.status().map(|s| s.as_u16()),
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| AgentError::ApiRequest {
            message: format!("failed to read response body: {e}"),
            status: Some(status.as_u16()),
        })?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "messages request rejected");
            return Err(AgentError::ApiRequest {
                message: error_message(&text),
                status: Some(status.as_u16()),
            });
        }

        Self::parse_body(&text)
    }

    fn convert_tool_definition(&self, tool: &ToolDefinition) -> Value {
        json!({
            "name": tool.name,
            "description": tool.description,
            "input_schema": tool.input_schema,
        })
    }

    fn build_tool_result_messages(&self, outcomes: &[ToolOutcome]) -> Vec<ChatMessage> {
        vec![tool_results_message(outcomes)]
    }
}

/// Extracts `error.message` from an error body, or returns the raw excerpt.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| excerpt(body))
}

fn excerpt(body: &str) -> String {
    body.chars().take(MAX_ERROR_EXCERPT).collect()
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
    stop_reason: Option<String>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

impl ResponseBlock {
    fn into_content_block(self) -> Option<ContentBlock> {
        match self {
            Self::Text { text } => Some(ContentBlock::Text { text }),
            Self::ToolUse { id, name, input } => Some(ContentBlock::ToolUse {
                id,
                name,
                input: match input {
                    Value::Object(map) => map,
                    _ => ToolArguments::new(),
                },
            }),
            Self::Other => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl From<AnthropicUsage> for TokenUsage {
    fn from(u: AnthropicUsage) -> Self {
        Self {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::message::user_message;

    fn provider() -> AnthropicProvider {
        let config = AgentConfig::builder()
            .api_key("test")
            .provider("anthropic")
            .build()
            .unwrap_or_else(|e| panic!("config failed: {e}"));
        AnthropicProvider::new(&config).unwrap_or_else(|e| panic!("provider failed: {e}"))
    }

    fn request(tools: Vec<ToolDefinition>) -> ChatRequest {
        ChatRequest {
            system_prompt: "system".to_string(),
            messages: vec![user_message("What is MCP?")],
            tools,
            temperature: 0.0,
            max_tokens: 1000,
        }
    }

    fn search_definition() -> ToolDefinition {
        ToolDefinition {
            name: "search_course_content".to_string(),
            description: "Search course materials".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"query": {"type": "string"}},
                "required": ["query"]
            }),
        }
    }

    #[test]
    fn test_messages_url() {
        assert_eq!(
            provider().messages_url(),
            "https://api.anthropic.com/v1/messages"
        );
    }

    #[test]
    fn test_build_request_without_tools_omits_tool_fields() {
        let p = provider();
        let req = request(Vec::new());
        let body = serde_json::to_value(p.build_request(&req)).unwrap_or_default();
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
        assert_eq!(body["system"], "system");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "What is MCP?");
        assert_eq!(body["max_tokens"], 1000);
    }

    #[test]
    fn test_build_request_with_tools_sets_auto_choice() {
        let p = provider();
        let req = request(vec![search_definition()]);
        let body = serde_json::to_value(p.build_request(&req)).unwrap_or_default();
        assert_eq!(body["tools"][0]["name"], "search_course_content");
        assert_eq!(body["tools"][0]["input_schema"]["required"][0], "query");
        assert_eq!(body["tool_choice"]["type"], "auto");
    }

    #[test]
    fn test_convert_tool_definition_is_identity() {
        let def = search_definition();
        let converted = provider().convert_tool_definition(&def);
        assert_eq!(converted["name"], json!(def.name));
        assert_eq!(converted["description"], json!(def.description));
        assert_eq!(converted["input_schema"], def.input_schema);
    }

    #[test]
    fn test_build_tool_result_messages_single_user_turn() {
        let messages = provider().build_tool_result_messages(&[
            ToolOutcome {
                tool_call_id: "toolu_1".to_string(),
                content: "one".to_string(),
            },
            ToolOutcome {
                tool_call_id: "toolu_2".to_string(),
                content: "two".to_string(),
            },
        ]);
        assert_eq!(messages.len(), 1);
        let wire = serde_json::to_value(AnthropicProvider::convert_message(&messages[0]))
            .unwrap_or_default();
        assert_eq!(wire["role"], "user");
        assert_eq!(wire["content"][0]["type"], "tool_result");
        assert_eq!(wire["content"][0]["tool_use_id"], "toolu_1");
        assert_eq!(wire["content"][1]["content"], "two");
    }

    #[test]
    fn test_normalize_text_reply() {
        let body = r#"{
            "id": "msg_1", "type": "message", "role": "assistant",
            "content": [{"type": "text", "text": "MCP is "}, {"type": "text", "text": "a protocol."}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 12, "output_tokens": 5}
        }"#;
        let response =
            AnthropicProvider::parse_body(body).unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert!(!response.requires_tool_execution());
        assert_eq!(response.content(), "MCP is a protocol.");
        assert_eq!(response.usage().prompt_tokens, 12);
    }

    #[test]
    fn test_normalize_tool_use_reply() {
        let body = r#"{
            "content": [
                {"type": "text", "text": "Let me search."},
                {"type": "tool_use", "id": "toolu_01A", "name": "search_course_content",
                 "input": {"query": "retrieval", "lesson_number": 1}},
                {"type": "tool_use", "id": "toolu_01B", "name": "get_course_outline",
                 "input": {"course_title": "MCP"}}
            ],
            "stop_reason": "tool_use"
        }"#;
        let response =
            AnthropicProvider::parse_body(body).unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert!(response.requires_tool_execution());
        assert!(response.content().is_empty());
        let calls = response.tool_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "toolu_01A");
        assert_eq!(calls[0].arguments.get("lesson_number"), Some(&json!(1)));
        assert_eq!(calls[1].name, "get_course_outline");

        let assistant = response.raw().assistant_message();
        assert!(matches!(assistant.content, MessageContent::Blocks(ref b) if b.len() == 3));
    }

    #[test]
    fn test_normalize_tool_blocks_without_tool_use_stop_reason() {
        let body = r#"{
            "content": [{"type": "tool_use", "id": "t", "name": "x", "input": {}}],
            "stop_reason": "max_tokens"
        }"#;
        let response =
            AnthropicProvider::parse_body(body).unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert!(!response.requires_tool_execution());
        assert_eq!(response.content(), "");
    }

    #[test]
    fn test_normalize_empty_refusal_is_text() {
        let body = r#"{"content": [], "stop_reason": "refusal"}"#;
        let response =
            AnthropicProvider::parse_body(body).unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert!(!response.requires_tool_execution());
        assert!(response.content().is_empty());
    }

    #[test]
    fn test_unknown_blocks_are_skipped() {
        let body = r#"{
            "content": [{"type": "thinking", "thinking": "..."}, {"type": "text", "text": "ok"}],
            "stop_reason": "end_turn"
        }"#;
        let response =
            AnthropicProvider::parse_body(body).unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert_eq!(response.content(), "ok");
    }

    #[test]
    fn test_parse_body_rejects_garbage() {
        let result = AnthropicProvider::parse_body("<html>bad gateway</html>");
        assert!(matches!(
            result,
            Err(AgentError::ResponseParse { ref content, .. }) if content.contains("bad gateway")
        ));
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"type":"error","error":{"type":"rate_limit_error","message":"slow down"}}"#;
        assert_eq!(error_message(body), "slow down");
        assert_eq!(error_message("plain"), "plain");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let rendered = format!("{:?}", provider());
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("\"test\""));
    }
}
