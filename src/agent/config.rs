//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::budget::TokenBudgets;
use super::history::DEFAULT_MAX_HISTORY;
use crate::error::AgentError;
use crate::retrieval::DEFAULT_MAX_RESULTS;

/// Default provider name.
const DEFAULT_PROVIDER: &str = "anthropic";
/// Default maximum sequential tool rounds per query.
const DEFAULT_MAX_TOOL_ROUNDS: usize = 2;
/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Base URL of the Anthropic Messages API.
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
/// Base URL of Groq's OpenAI-compatible API.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Configuration for the agent system.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// LLM provider name (`anthropic`, `openai`, `groq`).
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum sequential tool rounds per query.
    pub max_tool_rounds: usize,
    /// Token ceilings per response tier.
    pub budgets: TokenBudgets,
    /// Request timeout.
    pub timeout: Duration,
    /// Directory containing prompt template files.
    pub prompt_dir: Option<PathBuf>,
    /// Passages returned by one content search.
    pub max_results: usize,
    /// Conversation exchanges remembered by a chat session.
    pub max_history: usize,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }
}

/// Default model for a provider.
#[must_use]
pub fn default_model(provider: &str) -> &'static str {
    match provider {
        "groq" => "llama-3.3-70b-versatile",
        "openai" => "gpt-4o-mini",
        _ => "claude-sonnet-4-20250514",
    }
}

/// Default base URL for a provider (`None` uses the SDK default).
#[must_use]
pub fn default_base_url(provider: &str) -> Option<&'static str> {
    match provider {
        "anthropic" => Some(ANTHROPIC_BASE_URL),
        "groq" => Some(GROQ_BASE_URL),
        _ => None,
    }
}

/// Provider-specific API key variable.
fn provider_key_var(provider: &str) -> &'static str {
    match provider {
        "groq" => "GROQ_API_KEY",
        "openai" => "OPENAI_API_KEY",
        _ => "ANTHROPIC_API_KEY",
    }
}

/// Parses a trimmed variable value, ignoring values that do not parse.
fn parse_var<T: FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    temperature: Option<f32>,
    max_tool_rounds: Option<usize>,
    outline_budget: Option<u32>,
    comparison_budget: Option<u32>,
    content_budget: Option<u32>,
    general_budget: Option<u32>,
    timeout: Option<Duration>,
    debug: Option<bool>,
    prompt_dir: Option<PathBuf>,
    max_results: Option<usize>,
    max_history: Option<usize>,
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(self) -> Self {
        self.from_lookup(|key| std::env::var(key).ok())
    }

    /// Populates unset fields from an arbitrary variable lookup.
    ///
    /// Empty values count as unset; unparsable numbers are ignored.
    #[must_use]
    pub fn from_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.provider.is_none() {
            self.provider = var("COURSE_RAG_PROVIDER")
                .or_else(|| var("LLM_PROVIDER"))
                .map(|p| p.trim().to_lowercase());
        }
        if self.api_key.is_none() {
            let provider = self.provider.as_deref().unwrap_or(DEFAULT_PROVIDER);
            self.api_key = var("COURSE_RAG_API_KEY").or_else(|| var(provider_key_var(provider)));
        }
        if self.model.is_none() {
            self.model = var("COURSE_RAG_MODEL");
        }
        if self.base_url.is_none() {
            self.base_url = var("COURSE_RAG_BASE_URL");
        }
        if self.max_tool_rounds.is_none() {
            self.max_tool_rounds = parse_var(var("COURSE_RAG_MAX_TOOL_ROUNDS"));
        }
        if self.outline_budget.is_none() {
            self.outline_budget = parse_var(var("COURSE_RAG_BUDGET_OUTLINE"));
        }
        if self.comparison_budget.is_none() {
            self.comparison_budget = parse_var(var("COURSE_RAG_BUDGET_COMPARISON"));
        }
        if self.content_budget.is_none() {
            self.content_budget = parse_var(var("COURSE_RAG_BUDGET_CONTENT"));
        }
        if self.general_budget.is_none() {
            self.general_budget = parse_var(var("COURSE_RAG_BUDGET_GENERAL"));
        }
        if self.timeout.is_none() {
            self.timeout = parse_var(var("COURSE_RAG_TIMEOUT_SECS")).map(Duration::from_secs);
        }
        if self.debug.is_none() {
            self.debug = var("COURSE_RAG_DEBUG")
                .or_else(|| var("DEBUG"))
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1"));
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = var("COURSE_RAG_PROMPT_DIR").map(PathBuf::from);
        }
        if self.max_results.is_none() {
            self.max_results = parse_var(var("COURSE_RAG_MAX_RESULTS"));
        }
        if self.max_history.is_none() {
            self.max_history = parse_var(var("COURSE_RAG_MAX_HISTORY"));
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the maximum tool rounds per query.
    #[must_use]
    pub const fn max_tool_rounds(mut self, n: usize) -> Self {
        self.max_tool_rounds = Some(n);
        self
    }

    /// Sets all four token budgets.
    #[must_use]
    pub const fn budgets(mut self, budgets: TokenBudgets) -> Self {
        self.outline_budget = Some(budgets.outline);
        self.comparison_budget = Some(budgets.comparison);
        self.content_budget = Some(budgets.content);
        self.general_budget = Some(budgets.general);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Enables or disables debug tracing.
    #[must_use]
    pub const fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Whether debug tracing is on: the explicit flag, else
    /// `COURSE_RAG_DEBUG` / `DEBUG` once a lookup has run.
    ///
    /// Tracing is installed before a provider is chosen, so this is read
    /// from the builder rather than from a built [`AgentConfig`].
    #[must_use]
    pub fn debug_requested(&self) -> bool {
        self.debug.unwrap_or(false)
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Sets the number of passages returned by a content search.
    #[must_use]
    pub const fn max_results(mut self, n: usize) -> Self {
        self.max_results = Some(n);
        self
    }

    /// Sets the number of remembered conversation exchanges.
    #[must_use]
    pub const fn max_history(mut self, n: usize) -> Self {
        self.max_history = Some(n);
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key was set and
    /// [`AgentError::Config`] for a non-finite or negative temperature.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let provider = self
            .provider
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AgentError::ApiKeyMissing {
                provider: provider.clone(),
            })?;

        let temperature = self.temperature.unwrap_or(0.0);
        if !temperature.is_finite() || temperature < 0.0 {
            return Err(AgentError::Config {
                message: format!("temperature must be a non-negative number, got {temperature}"),
            });
        }

        let defaults = TokenBudgets::default();
        Ok(AgentConfig {
            model: self
                .model
                .unwrap_or_else(|| default_model(&provider).to_string()),
            base_url: self
                .base_url
                .or_else(|| default_base_url(&provider).map(str::to_string)),
            api_key,
            temperature,
            max_tool_rounds: self.max_tool_rounds.unwrap_or(DEFAULT_MAX_TOOL_ROUNDS),
            budgets: TokenBudgets {
                outline: self.outline_budget.unwrap_or(defaults.outline),
                comparison: self.comparison_budget.unwrap_or(defaults.comparison),
                content: self.content_budget.unwrap_or(defaults.content),
                general: self.general_budget.unwrap_or(defaults.general),
            },
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            prompt_dir: self.prompt_dir,
            max_results: self.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
            max_history: self.max_history.unwrap_or(DEFAULT_MAX_HISTORY),
            provider,
        })
    }
}
