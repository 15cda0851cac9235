//! Concrete [`LlmProvider`](crate::agent::provider::LlmProvider) backends.
//!
//! - [`AnthropicProvider`]: content-block style (Messages API).
//! - [`OpenAiProvider`]: choice/message style (`OpenAI`, Groq and other
//!   compatible endpoints).

mod anthropic;
mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;
