//! `get_course_outline`: course title, link, instructor and lesson list.

use std::fmt::Write as _;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::json;

use crate::agent::tool::{Source, Tool, ToolArguments, ToolDefinition, string_arg};
use crate::error::AgentError;
use crate::retrieval::{CourseMetadata, RetrievalService};

pub use crate::agent::budget::OUTLINE_TOOL_NAME;

/// Returns the outline of one course.
pub struct CourseOutlineTool {
    service: Arc<dyn RetrievalService>,
    last_sources: Mutex<Vec<Source>>,
}

impl CourseOutlineTool {
    #[must_use]
    pub fn new(service: Arc<dyn RetrievalService>) -> Self {
        Self {
            service,
            last_sources: Mutex::new(Vec::new()),
        }
    }

    /// Resolves `course_title` and renders its outline.
    #[must_use]
    pub fn run(&self, course_title: &str) -> String {
        self.store_sources(Vec::new());

        let Some(resolved) = self.service.resolve_course_name(course_title) else {
            return format!("Course not found: '{course_title}'. Please check the course name.");
        };

        let Some(course) = self
            .service
            .list_course_metadata()
            .into_iter()
            .find(|c| c.title == resolved)
        else {
            return format!("Error: Course metadata not available for '{resolved}'.");
        };

        self.store_sources(vec![Source {
            display_text: format!("{} - Course Outline", course.title),
            course_title: course.title.clone(),
            lesson_number: None,
            url: course.course_link.clone(),
        }]);
        format_outline(&course)
    }

    fn store_sources(&self, sources: Vec<Source>) {
        *self
            .last_sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = sources;
    }
}

/// Renders the fixed outline layout.
#[must_use]
pub fn format_outline(course: &CourseMetadata) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Course: {}", course.title);
    let _ = writeln!(
        out,
        "Course Link: {}",
        course.course_link.as_deref().unwrap_or("N/A")
    );
    let _ = writeln!(
        out,
        "Instructor: {}",
        course.instructor.as_deref().unwrap_or("N/A")
    );
    let _ = writeln!(out, "Total Lessons: {}", course.lesson_count());
    out.push_str("\nLesson Outline:\n");

    if course.lessons.is_empty() {
        out.push_str("  (No lesson details available)\n");
        return out;
    }

    for lesson in &course.lessons {
        let _ = write!(out, "  Lesson {}: {}", lesson.lesson_number, lesson.lesson_title);
        if let Some(link) = lesson.lesson_link.as_deref().filter(|l| !l.is_empty()) {
            let _ = write!(out, "\n    Link: {link}");
        }
        out.push('\n');
    }
    out
}

impl Tool for CourseOutlineTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: OUTLINE_TOOL_NAME.to_string(),
            description: "Get the complete outline of a course: the course title, course link, \
                          and a structured list of all lessons with their numbers and titles. \
                          Use this when users ask about course structure, topics covered, lesson \
                          organization, or what a course contains. Supports fuzzy course name \
                          matching (e.g., 'MCP' matches 'MCP: Build Rich-Context AI Apps with \
                          Anthropic')."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "course_title": {
                        "type": "string",
                        "description": "The course title or partial course name. Can be approximate (e.g., 'prompt engineering' or 'MCP')."
                    }
                },
                "required": ["course_title"]
            }),
        }
    }

    fn execute(&self, args: &ToolArguments) -> Result<String, AgentError> {
        let course_title =
            string_arg(args, "course_title").ok_or_else(|| AgentError::ToolExecution {
                name: OUTLINE_TOOL_NAME.to_string(),
                message: "missing required argument 'course_title'".to_string(),
            })?;
        Ok(self.run(course_title))
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

impl std::fmt::Debug for CourseOutlineTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourseOutlineTool").finish_non_exhaustive()
    }
}
