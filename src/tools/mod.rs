//! Retrieval tools exposed to the model.
//!
//! Both tools wrap a shared [`RetrievalService`] and record the course or
//! lesson they drew from in a per-tool source slot.

mod outline;
mod search;

use std::sync::Arc;

use crate::agent::registry::ToolRegistry;
use crate::error::AgentError;
use crate::retrieval::RetrievalService;

pub use outline::{CourseOutlineTool, OUTLINE_TOOL_NAME, format_outline};
pub use search::{CourseSearchTool, SEARCH_TOOL_NAME};

/// Builds a registry holding the content-search and outline tools.
///
/// Registration order is search first, then outline, which fixes the
/// order `ToolRegistry::last_sources` consults.
pub fn course_registry(service: Arc<dyn RetrievalService>) -> Result<ToolRegistry, AgentError> {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(CourseSearchTool::new(Arc::clone(&service))))?;
    registry.register(Box::new(CourseOutlineTool::new(service)))?;
    Ok(registry)
}
