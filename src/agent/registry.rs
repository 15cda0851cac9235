//! Tool registry: name-keyed dispatch and the citation side channel.
//!
//! The registry owns the tools available for one query. The orchestrator
//! dispatches through it; the caller reads the sources the tools recorded
//! once `generate` returns and clears them before the next query.

use tracing::debug;

use super::tool::{Source, Tool, ToolArguments, ToolDefinition};
use crate::error::AgentError;

/// A tool with the name it was registered under.
struct RegisteredTool {
    name: String,
    tool: Box<dyn Tool>,
}

/// Registered tools, in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool under its definition's name.
    ///
    /// The name is read once here; dispatch never rebuilds definitions.
    /// Registering a name twice replaces the earlier tool in place, so the
    /// definition order is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ToolRegistration`] if the tool's name is blank.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<(), AgentError> {
        let name = tool.definition().name;
        if name.trim().is_empty() {
            return Err(AgentError::ToolRegistration {
                message: "tool definition must have a non-empty name".to_string(),
            });
        }

        if let Some(slot) = self.tools.iter_mut().find(|t| t.name == name) {
            debug!(tool = %name, "replacing registered tool");
            slot.tool = tool;
        } else {
            debug!(tool = %name, "registered tool");
            self.tools.push(RegisteredTool { name, tool });
        }
        Ok(())
    }

    /// Definitions of every registered tool, in registration order.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.tool.definition()).collect()
    }

    /// Executes the named tool.
    ///
    /// An unknown name is not an error: the model gets the text
    /// `Tool '<name>' not found` back and may recover.
    ///
    /// # Errors
    ///
    /// Propagates the tool's own execution error.
    pub fn dispatch(&self, name: &str, args: &ToolArguments) -> Result<String, AgentError> {
        match self.find(name) {
            Some(tool) => tool.execute(args),
            None => {
                debug!(tool = %name, "dispatch to unknown tool");
                Ok(format!("Tool '{name}' not found"))
            }
        }
    }

    /// Sources of the first tool (in registration order) holding any.
    #[must_use]
    pub fn last_sources(&self) -> Vec<Source> {
        self.tools
            .iter()
            .map(|t| t.tool.last_sources())
            .find(|s| !s.is_empty())
            .unwrap_or_default()
    }

    /// Sources held by the named tool (empty for unknown names).
    #[must_use]
    pub fn sources_for(&self, name: &str) -> Vec<Source> {
        self.find(name).map(|t| t.last_sources()).unwrap_or_default()
    }

    /// Sources of every tool, concatenated in registration order.
    #[must_use]
    pub fn all_sources(&self) -> Vec<Source> {
        self.tools.iter().flat_map(|t| t.tool.last_sources()).collect()
    }

    /// Clears every tool's source slot.
    pub fn reset_sources(&self) {
        for registered in &self.tools {
            registered.tool.reset_sources();
        }
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Whether a tool with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.tool.as_ref())
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field(
                "tools",
                &self.tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
