//! Output formatting for CLI commands.

use std::fmt::Write as _;

use serde::Serialize;

use crate::agent::tool::Source;
use crate::retrieval::CourseMetadata;

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name; anything but `json` is text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }

    /// Serializes a value as pretty JSON with a trailing newline.
    #[must_use]
    pub fn to_json<T: Serialize + ?Sized>(self, value: &T) -> String {
        serde_json::to_string_pretty(value)
            .map(|s| s + "\n")
            .unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}\n"))
    }
}

/// Answer followed by a `Sources:` list.
#[must_use]
pub fn format_answer(answer: &str, sources: &[Source]) -> String {
    let mut output = answer.trim_end().to_string();
    output.push('\n');
    if !sources.is_empty() {
        output.push_str("\nSources:\n");
        for source in sources {
            match &source.url {
                Some(url) => {
                    let _ = writeln!(output, "  - {} ({url})", source.display_text);
                }
                None => {
                    let _ = writeln!(output, "  - {}", source.display_text);
                }
            }
        }
    }
    output
}

/// One line per course with its lesson count.
#[must_use]
pub fn format_course_list(courses: &[CourseMetadata]) -> String {
    if courses.is_empty() {
        return "No courses in catalog.\n".to_string();
    }
    let mut output = format!("{} course(s):\n", courses.len());
    for course in courses {
        let _ = write!(output, "  {} ({} lessons)", course.title, course.lesson_count());
        if let Some(instructor) = &course.instructor {
            let _ = write!(output, " - {instructor}");
        }
        output.push('\n');
    }
    output
}
