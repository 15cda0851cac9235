//! `OpenAI` provider implementation using the `async-openai` crate.
//!
//! Choice/message backend: tool calls arrive on the first choice's message
//! with JSON-encoded argument strings, and tool results go back as one
//! `tool`-role message per call. Supports any `OpenAI`-compatible API
//! (`OpenAI`, Groq, local proxies) via the base URL in [`AgentConfig`].

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessage,
    ChatCompletionRequestAssistantMessageContent, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessage, ChatCompletionRequestSystemMessageContent,
    ChatCompletionRequestToolMessage, ChatCompletionRequestToolMessageContent,
    ChatCompletionRequestUserMessage, ChatCompletionRequestUserMessageContent, ChatCompletionTool,
    ChatCompletionToolChoiceOption, ChatCompletionToolType, CreateChatCompletionRequest,
    CreateChatCompletionResponse, FinishReason, FunctionCall,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::agent::config::AgentConfig;
use crate::agent::message::{
    BackendPayload, ChatMessage, ChatRequest, GeneratedResponse, Role, TokenUsage, ToolCall,
    ToolOutcome, parse_arguments, tool_message,
};
use crate::agent::provider::LlmProvider;
use crate::agent::tool::ToolDefinition;
use crate::error::AgentError;

/// `OpenAI`-compatible LLM provider.
///
/// Wraps the `async-openai` client for chat completions. Compatible
/// with any API that follows the `OpenAI` chat completion protocol.
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    model: String,
    name: &'static str,
}

impl OpenAiProvider {
    /// Creates a new provider from agent configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);

        if let Some(ref base_url) = config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::Config {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client: Client::with_config(openai_config).with_http_client(http_client),
            model: config.model.clone(),
            name: if config.provider == "groq" {
                "groq"
            } else {
                "openai"
            },
        })
    }

    /// Converts our message type to the `OpenAI` SDK type.
    fn convert_message(msg: &ChatMessage) -> ChatCompletionRequestMessage {
        match msg.role {
            Role::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(msg.content.as_text()),
                name: None,
            }),
            Role::Assistant => {
                let tool_calls = if msg.tool_calls.is_empty() {
                    None
                } else {
                    Some(
                        msg.tool_calls
                            .iter()
                            .map(|tc| ChatCompletionMessageToolCall {
                                id: tc.id.clone(),
                                r#type: ChatCompletionToolType::Function,
                                function: FunctionCall {
                                    name: tc.name.clone(),
                                    arguments: Value::Object(tc.arguments.clone()).to_string(),
                                },
                            })
                            .collect(),
                    )
                };

                let text = msg.content.as_text();
                let content = if text.is_empty() {
                    None
                } else {
                    Some(ChatCompletionRequestAssistantMessageContent::Text(text))
                };

                #[allow(deprecated)]
                ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                    content,
                    name: None,
                    tool_calls,
                    refusal: None,
                    audio: None,
                    function_call: None,
                })
            }
            Role::Tool => ChatCompletionRequestMessage::Tool(ChatCompletionRequestToolMessage {
                content: ChatCompletionRequestToolMessageContent::Text(msg.content.as_text()),
                tool_call_id: msg.tool_call_id.clone().unwrap_or_default(),
            }),
        }
    }

    /// Builds an `OpenAI` chat completion request from our generic request.
    ///
    /// Tools go through [`LlmProvider::convert_tool_definition`] so the
    /// request carries exactly the wire shape that method documents.
    fn build_request(
        &self,
        request: &ChatRequest,
    ) -> Result<CreateChatCompletionRequest, AgentError> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(
                    request.system_prompt.clone(),
                ),
                name: None,
            },
        ));
        messages.extend(request.messages.iter().map(Self::convert_message));

        let (tools, tool_choice) = if request.tools.is_empty() {
            (None, None)
        } else {
            let tools = request
                .tools
                .iter()
                .map(|td| {
                    serde_json::from_value::<ChatCompletionTool>(self.convert_tool_definition(td))
                        .map_err(|e| AgentError::ToolRegistration {
                            message: format!("invalid tool definition '{}': {e}", td.name),
                        })
                })
                .collect::<Result<Vec<_>, AgentError>>()?;
            (Some(tools), Some(ChatCompletionToolChoiceOption::Auto))
        };

        Ok(CreateChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(request.temperature),
            max_completion_tokens: Some(request.max_tokens),
            tools,
            tool_choice,
            ..Default::default()
        })
    }

    /// Normalizes a chat completion into a [`GeneratedResponse`].
    fn normalize(response: CreateChatCompletionResponse) -> Result<GeneratedResponse, AgentError> {
        let usage = response
            .usage
            .map_or_else(TokenUsage::default, |u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            });

        let Some(choice) = response.choices.into_iter().next() else {
            let raw = BackendPayload::Choice {
                content: None,
                tool_calls: Vec::new(),
                finish_reason: None,
            };
            return Ok(GeneratedResponse::text(String::new(), raw, usage));
        };

        let finish_reason = choice.finish_reason;
        let content = choice.message.content;
        let sdk_calls = choice.message.tool_calls.unwrap_or_default();
        let finish_label = finish_reason.as_ref().and_then(finish_reason_label);

        if matches!(finish_reason, Some(FinishReason::ToolCalls)) && !sdk_calls.is_empty() {
            let tool_calls = sdk_calls
                .into_iter()
                .map(|tc| {
                    let arguments = parse_arguments(&tc.function.arguments).map_err(|e| {
                        AgentError::ResponseParse {
                            message: format!(
                                "invalid arguments for tool '{}': {e}",
                                tc.function.name
                            ),
                            content: tc.function.arguments.clone(),
                        }
                    })?;
                    Ok(ToolCall {
                        id: tc.id,
                        name: tc.function.name,
                        arguments,
                    })
                })
                .collect::<Result<Vec<_>, AgentError>>()?;

            let raw = BackendPayload::Choice {
                content,
                tool_calls: tool_calls.clone(),
                finish_reason: finish_label,
            };
            return Ok(GeneratedResponse::tool_use(tool_calls, raw, usage));
        }

        let text = content.clone().unwrap_or_default();
        let raw = BackendPayload::Choice {
            content,
            tool_calls: Vec::new(),
            finish_reason: finish_label,
        };
        Ok(GeneratedResponse::text(text, raw, usage))
    }
}

/// Wire label of a finish reason (`"tool_calls"`, `"stop"`, ...).
fn finish_reason_label(reason: &FinishReason) -> Option<String> {
    serde_json::to_value(reason)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("client", &"<async-openai::Client>")
            .finish()
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn generate(&self, request: &ChatRequest) -> Result<GeneratedResponse, AgentError> {
        let openai_request = self.build_request(request)?;
        debug!(
            provider = self.name,
            model = %self.model,
            messages = openai_request.messages.len(),
            tools = openai_request.tools.as_ref().map_or(0, Vec::len),
            max_tokens = request.max_tokens,
            "sending chat completion request"
        );

        let response = self
            .client
            .chat()
            .create(openai_request)
            .await
            .map_err(|e| {
                warn!(provider = self.name, error = %e, "chat completion failed");
                map_openai_error(&e)
            })?;

        Self::normalize(response)
    }

    fn convert_tool_definition(&self, tool: &ToolDefinition) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.input_schema,
            }
        })
    }

    fn build_tool_result_messages(&self, outcomes: &[ToolOutcome]) -> Vec<ChatMessage> {
        outcomes
            .iter()
            .map(|o| tool_message(&o.tool_call_id, &o.content))
            .collect()
    }
}

/// Maps an SDK error into the agent error taxonomy.
fn map_openai_error(error: &async_openai::error::OpenAIError) -> AgentError {
    use async_openai::error::OpenAIError;

    match error {
        OpenAIError::Reqwest(e) => AgentError::ApiRequest {
            message: e.to_string(),
            status: e.status().map(|s| s.as_u16()),
        },
        OpenAIError::JSONDeserialize(e) => AgentError::ResponseParse {
            message: e.to_string(),
            content: String::new(),
        },
        other => AgentError::ApiRequest {
            message: other.to_string(),
            status: None,
        },
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::message::user_message;

    fn provider(name: &str) -> OpenAiProvider {
        let config = AgentConfig::builder()
            .api_key("test")
            .provider(name)
            .build()
            .unwrap_or_else(|e| panic!("config failed: {e}"));
        OpenAiProvider::new(&config).unwrap_or_else(|e| panic!("provider failed: {e}"))
    }

    fn request(tools: Vec<ToolDefinition>) -> ChatRequest {
        ChatRequest {
            system_prompt: "system".to_string(),
            messages: vec![user_message("What is MCP?")],
            tools,
            temperature: 0.0,
            max_tokens: 1200,
        }
    }

    fn outline_definition() -> ToolDefinition {
        ToolDefinition {
            name: "get_course_outline".to_string(),
            description: "Get a course outline".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"course_title": {"type": "string"}},
                "required": ["course_title"]
            }),
        }
    }

    fn completion(message: &Value, finish_reason: &str) -> CreateChatCompletionResponse {
        let body = json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "llama-3.3-70b-versatile",
            "choices": [{
                "index": 0,
                "message": message,
                "finish_reason": finish_reason,
                "logprobs": null
            }],
            "usage": {"prompt_tokens": 30, "completion_tokens": 7, "total_tokens": 37}
        });
        serde_json::from_value(body).unwrap_or_else(|e| panic!("fixture failed: {e}"))
    }

    #[test]
    fn test_provider_name_follows_config() {
        assert_eq!(provider("openai").name(), "openai");
        assert_eq!(provider("groq").name(), "groq");
    }

    #[test]
    fn test_build_request_prepends_system_message() {
        let p = provider("openai");
        let built = p
            .build_request(&request(Vec::new()))
            .unwrap_or_else(|e| panic!("build failed: {e}"));
        assert_eq!(built.messages.len(), 2);
        assert!(matches!(
            built.messages[0],
            ChatCompletionRequestMessage::System(_)
        ));
        assert!(built.tools.is_none());
        assert!(built.tool_choice.is_none());
        assert_eq!(built.temperature, Some(0.0));
        assert_eq!(built.max_completion_tokens, Some(1200));
    }

    #[test]
    fn test_build_request_with_tools() {
        let p = provider("groq");
        let def = outline_definition();
        let built = p
            .build_request(&request(vec![def.clone()]))
            .unwrap_or_else(|e| panic!("build failed: {e}"));
        let tools = built.tools.clone().unwrap_or_default();
        assert_eq!(tools.len(), 1);
        assert!(matches!(
            built.tool_choice,
            Some(ChatCompletionToolChoiceOption::Auto)
        ));

        let sent = serde_json::to_value(&tools[0]).unwrap_or_else(|e| panic!("encode: {e}"));
        let converted = p.convert_tool_definition(&def);
        assert_eq!(sent["type"], converted["type"]);
        assert_eq!(sent["function"]["name"], converted["function"]["name"]);
        assert_eq!(
            sent["function"]["description"],
            converted["function"]["description"]
        );
        assert_eq!(
            sent["function"]["parameters"],
            converted["function"]["parameters"]
        );
    }

    #[test]
    fn test_convert_tool_definition_function_wrapper() {
        let def = outline_definition();
        let converted = provider("openai").convert_tool_definition(&def);
        assert_eq!(converted["type"], "function");
        assert_eq!(converted["function"]["name"], "get_course_outline");
        assert_eq!(converted["function"]["description"], "Get a course outline");
        assert_eq!(converted["function"]["parameters"], def.input_schema);
    }

    #[test]
    fn test_build_tool_result_messages_one_per_call() {
        let messages = provider("openai").build_tool_result_messages(&[
            ToolOutcome {
                tool_call_id: "call_a".to_string(),
                content: "A".to_string(),
            },
            ToolOutcome {
                tool_call_id: "call_b".to_string(),
                content: "B".to_string(),
            },
        ]);
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.role == Role::Tool));
        assert_eq!(messages[1].tool_call_id.as_deref(), Some("call_b"));
        assert!(matches!(
            OpenAiProvider::convert_message(&messages[0]),
            ChatCompletionRequestMessage::Tool(_)
        ));
    }

    #[test]
    fn test_convert_assistant_with_tool_calls() {
        let raw = BackendPayload::Choice {
            content: None,
            tool_calls: vec![ToolCall {
                id: "call_1".to_string(),
                name: "get_course_outline".to_string(),
                arguments: json!({"course_title": "MCP"})
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
            }],
            finish_reason: Some("tool_calls".to_string()),
        };
        let converted = OpenAiProvider::convert_message(&raw.assistant_message());
        if let ChatCompletionRequestMessage::Assistant(a) = converted {
            assert!(a.content.is_none());
            let calls = a.tool_calls.unwrap_or_default();
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].id, "call_1");
            assert_eq!(calls[0].function.arguments, r#"{"course_title":"MCP"}"#);
        } else {
            panic!("Expected Assistant message");
        }
    }

    #[test]
    fn test_normalize_text_reply() {
        let response = OpenAiProvider::normalize(completion(
            &json!({"role": "assistant", "content": "MCP is a protocol."}),
            "stop",
        ))
        .unwrap_or_else(|e| panic!("normalize failed: {e}"));
        assert!(!response.requires_tool_execution());
        assert_eq!(response.content(), "MCP is a protocol.");
        assert_eq!(response.usage().completion_tokens, 7);
    }

    #[test]
    fn test_normalize_tool_call_reply() {
        let response = OpenAiProvider::normalize(completion(
            &json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_abc",
                    "type": "function",
                    "function": {
                        "name": "search_course_content",
                        "arguments": "{\"query\":\"retrieval\",\"lesson_number\":\"2\"}"
                    }
                }]
            }),
            "tool_calls",
        ))
        .unwrap_or_else(|e| panic!("normalize failed: {e}"));
        assert!(response.requires_tool_execution());
        let call = &response.tool_calls()[0];
        assert_eq!(call.id, "call_abc");
        assert_eq!(call.arguments.get("query"), Some(&json!("retrieval")));
        assert!(matches!(
            response.raw(),
            BackendPayload::Choice { finish_reason: Some(r), .. } if r == "tool_calls"
        ));
    }

    #[test]
    fn test_normalize_tool_calls_require_finish_reason() {
        let response = OpenAiProvider::normalize(completion(
            &json!({
                "role": "assistant",
                "content": "partial",
                "tool_calls": [{
                    "id": "call_abc",
                    "type": "function",
                    "function": {"name": "search_course_content", "arguments": "{}"}
                }]
            }),
            "stop",
        ))
        .unwrap_or_else(|e| panic!("normalize failed: {e}"));
        assert!(!response.requires_tool_execution());
        assert_eq!(response.content(), "partial");
    }

    #[test]
    fn test_normalize_malformed_arguments() {
        let result = OpenAiProvider::normalize(completion(
            &json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_abc",
                    "type": "function",
                    "function": {"name": "search_course_content", "arguments": "{query: oops"}
                }]
            }),
            "tool_calls",
        ));
        assert!(matches!(result, Err(AgentError::ResponseParse { .. })));
    }

    #[test]
    fn test_normalize_null_content_is_empty_text() {
        let response = OpenAiProvider::normalize(completion(
            &json!({"role": "assistant", "content": null}),
            "content_filter",
        ))
        .unwrap_or_else(|e| panic!("normalize failed: {e}"));
        assert!(!response.requires_tool_execution());
        assert_eq!(response.content(), "");
    }
}
