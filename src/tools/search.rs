//! `search_course_content`: passage search with course and lesson filters.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::json;
use tracing::debug;

use crate::agent::tool::{Source, Tool, ToolArguments, ToolDefinition, integer_arg, string_arg};
use crate::error::AgentError;
use crate::retrieval::{RetrievalService, SearchResults};

/// Tool name.
pub const SEARCH_TOOL_NAME: &str = "search_course_content";

/// Marker in a retrieval error that means the course filter did not resolve.
const COURSE_NOT_FOUND_MARKER: &str = "No course found";

/// Searches lesson passages and records the course/lesson sources it used.
pub struct CourseSearchTool {
    service: Arc<dyn RetrievalService>,
    last_sources: Mutex<Vec<Source>>,
}

impl CourseSearchTool {
    /// Creates the tool over a retrieval service.
    #[must_use]
    pub fn new(service: Arc<dyn RetrievalService>) -> Self {
        Self {
            service,
            last_sources: Mutex::new(Vec::new()),
        }
    }

    /// Runs a search with already-normalized arguments.
    ///
    /// A course filter that does not resolve triggers exactly one retry
    /// across all courses (without any filter). The retry is only used when
    /// it succeeds with passages; otherwise the original error is returned.
    #[must_use]
    pub fn run(&self, query: &str, course_name: Option<&str>, lesson_number: Option<u32>) -> String {
        self.store_sources(Vec::new());
        let results = self.service.search(query, course_name, lesson_number);

        if let Some(error) = results.error_message() {
            if let Some(course) = course_name.filter(|_| error.contains(COURSE_NOT_FOUND_MARKER)) {
                debug!(course, "course filter unresolved, searching all courses");
                let fallback = self.service.search(query, None, None);
                if fallback.error_message().is_none() && !fallback.is_empty() {
                    return format!(
                        "[Searched all courses since '{course}' wasn't found]\n\n{}",
                        self.format_results(&fallback)
                    );
                }
            }
            return error.to_string();
        }

        if results.is_empty() {
            let mut filter = String::new();
            if let Some(course) = course_name {
                filter.push_str(&format!(" in course '{course}'"));
            }
            if let Some(lesson) = lesson_number {
                filter.push_str(&format!(" in lesson {lesson}"));
            }
            return format!("No relevant content found{filter}.");
        }

        self.format_results(&results)
    }

    /// Formats passages under `[course - Lesson n]` headers and records
    /// one source per distinct `(course, lesson)` in first-seen order.
    fn format_results(&self, results: &SearchResults) -> String {
        let mut sources: Vec<Source> = Vec::new();
        let mut blocks = Vec::with_capacity(results.len());

        for (document, meta) in results.iter() {
            let label = match meta.lesson_number {
                Some(n) => format!("{} - Lesson {n}", meta.course_title),
                None => meta.course_title.clone(),
            };

            let key = (meta.course_title.as_str(), meta.lesson_number);
            if !sources.iter().any(|s| s.key() == key) {
                sources.push(Source {
                    display_text: label.clone(),
                    course_title: meta.course_title.clone(),
                    lesson_number: meta.lesson_number,
                    url: self
                        .service
                        .get_source_link(&meta.course_title, meta.lesson_number),
                });
            }

            blocks.push(format!("[{label}]\n{document}"));
        }

        self.store_sources(sources);
        blocks.join("\n\n")
    }

    fn store_sources(&self, sources: Vec<Source>) {
        *self
            .last_sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = sources;
    }
}

impl Tool for CourseSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: SEARCH_TOOL_NAME.to_string(),
            description: "Search course materials with smart course name matching and lesson \
                          filtering. Only include course_name and lesson_number if specifically \
                          mentioned in the query."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content"
                    },
                    "course_name": {
                        "type": ["string", "null"],
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction'). Use null or omit if not specified in query."
                    },
                    "lesson_number": {
                        "type": ["integer", "null"],
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3). Use null or omit if not specified."
                    }
                },
                "required": ["query"]
            }),
        }
    }

    fn execute(&self, args: &ToolArguments) -> Result<String, AgentError> {
        let query = string_arg(args, "query").ok_or_else(|| AgentError::ToolExecution {
            name: SEARCH_TOOL_NAME.to_string(),
            message: "missing required argument 'query'".to_string(),
        })?;
        Ok(self.run(
            query,
            string_arg(args, "course_name"),
            integer_arg(args, "lesson_number"),
        ))
    }

    fn last_sources(&self) -> Vec<Source> {
        self.last_sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn reset_sources(&self) {
        self.store_sources(Vec::new());
    }
}

impl std::fmt::Debug for CourseSearchTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourseSearchTool").finish_non_exhaustive()
    }
}
