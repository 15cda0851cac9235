//! Orchestrator for bounded multi-round tool calling.
//!
//! Drives one question through the model: an initial call with the tool
//! set, then up to `max_tool_rounds` rounds of {dispatch requested tools →
//! follow-up call}. Tools are withheld from the call that closes the last
//! round, so the model must answer with what it has. At most
//! `max_tool_rounds + 1` backend calls are made per question.
//!
//! The orchestrator holds no per-query state; a single instance can serve
//! concurrent queries as long as each brings its own [`ToolRegistry`].

use std::sync::Arc;

use tracing::{debug, warn};

use super::budget::{Budget, BudgetPolicy};
use super::config::AgentConfig;
use super::message::{ChatMessage, ChatRequest, ToolOutcome, user_message};
use super::prompt::PromptSet;
use super::provider::LlmProvider;
use super::registry::ToolRegistry;
use super::tool::ToolDefinition;
use crate::error::AgentError;

/// Returned when the model still wants tools after the last round.
pub const ROUND_LIMIT_FALLBACK: &str =
    "I was unable to complete the answer within the allowed number of tool calls.";

/// Returned when the loop ends without any other outcome.
pub const SAFETY_FALLBACK: &str = "I'm sorry, I was unable to complete that request.";

/// Characters of each tool result shown in debug traces.
const TRACE_PREVIEW_CHARS: usize = 200;

/// Answers questions through an [`LlmProvider`] and a tool registry.
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    prompts: PromptSet,
    policy: BudgetPolicy,
    temperature: f32,
    max_tool_rounds: usize,
}

impl Orchestrator {
    /// Creates a new orchestrator with the given provider and configuration.
    ///
    /// Loads the system prompt from [`AgentConfig::prompt_dir`], falling back
    /// to the compiled-in default, and uses the default budget keywords with
    /// the configured budgets.
    pub fn new(provider: Arc<dyn LlmProvider>, config: &AgentConfig) -> Self {
        Self {
            provider,
            prompts: PromptSet::load(config.prompt_dir.as_deref()),
            policy: BudgetPolicy::with_budgets(config.budgets),
            temperature: config.temperature,
            max_tool_rounds: config.max_tool_rounds,
        }
    }

    /// Replaces the prompt set.
    #[must_use]
    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    /// Replaces the budget policy.
    #[must_use]
    pub fn with_policy(mut self, policy: BudgetPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Overrides the maximum number of tool rounds.
    #[must_use]
    pub const fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    /// Maximum tool rounds per question.
    #[must_use]
    pub const fn max_tool_rounds(&self) -> usize {
        self.max_tool_rounds
    }

    /// Name of the underlying provider.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Answers `query`, dispatching requested tools through `registry`.
    ///
    /// `history` is the caller's flattened conversation window. `tools` are
    /// offered to the model on every call except the one closing the last
    /// round. Tool failures and follow-up transport failures end the loop
    /// with a readable message instead of an error.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the initial call fails.
    pub async fn generate(
        &self,
        query: &str,
        history: Option<&str>,
        tools: Option<&[ToolDefinition]>,
        registry: Option<&ToolRegistry>,
    ) -> Result<String, AgentError> {
        let system_prompt = self.prompts.build_system_prompt(history);
        let tool_defs = tools.map(<[ToolDefinition]>::to_vec).unwrap_or_default();
        let mut messages = vec![user_message(query)];
        let mut tools_used: Vec<String> = Vec::new();

        let budget = self.policy.select(query, &tools_used);
        debug!(
            round = 0,
            tier = %budget.tier,
            max_tokens = budget.max_tokens,
            tools_enabled = !tool_defs.is_empty(),
            "initial model call"
        );
        let mut response = self
            .provider
            .generate(&self.request(&system_prompt, &messages, tool_defs.clone(), budget))
            .await?;

        if !response.requires_tool_execution() {
            return Ok(response.into_text());
        }
        if self.max_tool_rounds == 0 {
            debug!("tool use requested but no tool rounds are allowed");
            return Ok(ROUND_LIMIT_FALLBACK.to_string());
        }
        let Some(registry) = registry else {
            warn!("model requested tools but no registry was supplied");
            return Ok(SAFETY_FALLBACK.to_string());
        };

        for round in 1..=self.max_tool_rounds {
            messages.push(response.raw().assistant_message());

            let mut outcomes = Vec::with_capacity(response.tool_calls().len());
            for call in response.tool_calls() {
                debug!(
                    round,
                    tool = %call.name,
                    arguments = %serde_json::Value::Object(call.arguments.clone()),
                    "dispatching tool"
                );
                let content = match registry.dispatch(&call.name, &call.arguments) {
                    Ok(content) => content,
                    Err(e) => {
                        warn!(round, tool = %call.name, error = %e, "tool execution failed");
                        return Ok(format!("Error executing tool '{}': {e}", call.name));
                    }
                };
                debug!(round, tool = %call.name, preview = %preview(&content), "tool result");
                tools_used.push(call.name.clone());
                outcomes.push(ToolOutcome {
                    tool_call_id: call.id.clone(),
                    content,
                });
            }
            messages.extend(self.provider.build_tool_result_messages(&outcomes));

            let last_round = round == self.max_tool_rounds;
            let next_tools = if last_round {
                Vec::new()
            } else {
                tool_defs.clone()
            };
            let budget = self.policy.select(query, &tools_used);
            debug!(
                round,
                tier = %budget.tier,
                max_tokens = budget.max_tokens,
                tools_enabled = !next_tools.is_empty(),
                "follow-up model call"
            );

            response = match self
                .provider
                .generate(&self.request(&system_prompt, &messages, next_tools, budget))
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!(round, error = %e, "follow-up model call failed");
                    return Ok(format!(
                        "Error generating response after tool execution: {e}"
                    ));
                }
            };

            if !response.requires_tool_execution() {
                return Ok(response.into_text());
            }
            if last_round {
                let text = response.into_text();
                return Ok(if text.is_empty() {
                    ROUND_LIMIT_FALLBACK.to_string()
                } else {
                    text
                });
            }
        }

        Ok(SAFETY_FALLBACK.to_string())
    }

    fn request(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        tools: Vec<ToolDefinition>,
        budget: Budget,
    ) -> ChatRequest {
        ChatRequest {
            system_prompt: system_prompt.to_string(),
            messages: messages.to_vec(),
            tools,
            temperature: self.temperature,
            max_tokens: budget.max_tokens,
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("provider", &self.provider.name())
            .field("temperature", &self.temperature)
            .field("max_tool_rounds", &self.max_tool_rounds)
            .finish_non_exhaustive()
    }
}

/// First [`TRACE_PREVIEW_CHARS`] characters of a tool result.
fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(TRACE_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
