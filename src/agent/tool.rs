//! Tool abstraction for model function-calling.
//!
//! Provides the provider-agnostic tool descriptor exchanged with adapters,
//! the [`Tool`] capability retrieval tools implement, and the [`Source`]
//! citation record tools leave behind for the caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AgentError;

/// Arguments of a tool call: a JSON object of scalars (or null).
pub type ToolArguments = serde_json::Map<String, Value>;

/// A generic tool descriptor, handed to provider adapters for conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (dispatch key in the registry).
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema object describing the tool's parameters.
    pub input_schema: Value,
}

/// A citation record for one course or lesson a tool result came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Label shown to the user.
    pub display_text: String,
    /// Canonical course title.
    pub course_title: String,
    /// Lesson number, when the source is a single lesson.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_number: Option<u32>,
    /// Best available link for the course or lesson.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Source {
    /// Deduplication key: `(course_title, lesson_number)`.
    #[must_use]
    pub fn key(&self) -> (&str, Option<u32>) {
        (self.course_title.as_str(), self.lesson_number)
    }
}

/// A capability the model may invoke by name.
///
/// Tools that produce citations keep them in a private slot, overwritten on
/// every `execute` and exposed through [`Tool::last_sources`].
pub trait Tool: Send + Sync {
    /// The descriptor sent to the model. Its `name` must be unique.
    fn definition(&self) -> ToolDefinition;

    /// Executes the tool with the model-supplied arguments.
    ///
    /// Expected conditions (nothing found, unknown course) are reported as
    /// `Ok` text for the model; `Err` is reserved for failures of the tool
    /// itself.
    fn execute(&self, args: &ToolArguments) -> Result<String, AgentError>;

    /// Sources recorded by the most recent `execute`.
    fn last_sources(&self) -> Vec<Source> {
        Vec::new()
    }

    /// Clears the source slot.
    fn reset_sources(&self) {}
}

/// Reads an optional string argument. Missing, `null` and `""` all mean "no value".
#[must_use]
pub fn string_arg<'a>(args: &'a ToolArguments, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Reads an optional non-negative integer argument.
///
/// Accepts JSON integers, whole floats (`1.0`) and numeric strings (some
/// backends stringify or float-encode numbers). Missing, `null` and `""`
/// mean "no value"; fractional or negative numbers are ignored.
#[must_use]
pub fn integer_arg(args: &ToolArguments, key: &str) -> Option<u32> {
    match args.get(key)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().and_then(whole_number))
            .and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_number))
                .and_then(|v| u32::try_from(v).ok())
        }
        _ => None,
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn whole_number(v: f64) -> Option<u64> {
    (v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64).then(|| v as u64)
}
