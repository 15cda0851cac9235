//! Retrieval-service boundary consumed by the course tools.
//!
//! [`RetrievalService`] is the opaque search backend: semantic search over
//! lesson passages, fuzzy course-name resolution, link lookup and course
//! metadata. [`CourseCatalog`] is the in-memory implementation loaded from a
//! JSON file.

mod catalog;

use serde::{Deserialize, Serialize};

pub use catalog::{CatalogChunk, CatalogFile, CourseCatalog, DEFAULT_MAX_RESULTS};

/// Provenance of one retrieved passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Canonical title of the course the passage belongs to.
    pub course_title: String,
    /// Lesson the passage belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_number: Option<u32>,
    /// Position of the passage within its course.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<u32>,
}

/// Passages returned by a search, aligned 1:1 with their metadata.
///
/// A result either carries passages (possibly none) or an error message,
/// never both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    documents: Vec<String>,
    metadata: Vec<ChunkMetadata>,
    error: Option<String>,
}

impl SearchResults {
    /// Successful results from `(passage, metadata)` pairs.
    #[must_use]
    pub fn from_hits(hits: Vec<(String, ChunkMetadata)>) -> Self {
        let (documents, metadata) = hits.into_iter().unzip();
        Self {
            documents,
            metadata,
            error: None,
        }
    }

    /// A failed search.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            documents: Vec::new(),
            metadata: Vec::new(),
            error: Some(message.into()),
        }
    }

    /// Successful search with no hits.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Retrieved passages.
    #[must_use]
    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    /// Metadata aligned with [`documents`](Self::documents).
    #[must_use]
    pub fn metadata(&self) -> &[ChunkMetadata] {
        &self.metadata
    }

    /// Error message of a failed search.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether there are no passages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of passages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Iterates `(passage, metadata)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChunkMetadata)> {
        self.documents
            .iter()
            .map(String::as_str)
            .zip(self.metadata.iter())
    }
}

/// One lesson of a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonMetadata {
    /// Lesson number (catalogs may start at 0).
    pub lesson_number: u32,
    /// Lesson title.
    pub lesson_title: String,
    /// Lesson link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_link: Option<String>,
}

/// Course-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseMetadata {
    /// Canonical course title.
    pub title: String,
    /// Course link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_link: Option<String>,
    /// Instructor name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    /// Lessons in catalog order.
    #[serde(default)]
    pub lessons: Vec<LessonMetadata>,
    /// Explicit lesson count, when the source states one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_count: Option<usize>,
}

impl CourseMetadata {
    /// Stated lesson count, or the number of listed lessons.
    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.lesson_count.unwrap_or(self.lessons.len())
    }

    /// Looks up a lesson by number.
    #[must_use]
    pub fn lesson(&self, number: u32) -> Option<&LessonMetadata> {
        self.lessons.iter().find(|l| l.lesson_number == number)
    }
}

/// The search backend the course tools are built on.
///
/// Implementations report search failures through
/// [`SearchResults::error`] rather than panicking or returning `Err`; the
/// message `No course found matching '<name>'` signals an unresolvable
/// course filter.
pub trait RetrievalService: Send + Sync {
    /// Searches passages, optionally restricted to a course and/or lesson.
    fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> SearchResults;

    /// Maps a partial course name to a canonical title.
    fn resolve_course_name(&self, partial: &str) -> Option<String>;

    /// Best link for a course or one of its lessons.
    fn get_source_link(&self, course_title: &str, lesson_number: Option<u32>) -> Option<String>;

    /// Metadata of every known course.
    fn list_course_metadata(&self) -> Vec<CourseMetadata>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(course: &str, lesson: Option<u32>) -> ChunkMetadata {
        ChunkMetadata {
            course_title: course.to_string(),
            lesson_number: lesson,
            chunk_index: None,
        }
    }

    #[test]
    fn test_error_results_carry_no_passages() {
        let results = SearchResults::error("No course found matching 'x'");
        assert!(results.is_empty());
        assert_eq!(results.error_message(), Some("No course found matching 'x'"));
    }

    #[test]
    fn test_empty_is_not_error() {
        let results = SearchResults::empty();
        assert!(results.is_empty());
        assert!(results.error_message().is_none());
    }

    #[test]
    fn test_from_hits_aligns_metadata() {
        let results = SearchResults::from_hits(vec![
            ("a".to_string(), meta("C", Some(1))),
            ("b".to_string(), meta("C", None)),
        ]);
        assert_eq!(results.len(), 2);
        let pairs: Vec<_> = results.iter().collect();
        assert_eq!(pairs[1].0, "b");
        assert_eq!(pairs[1].1.lesson_number, None);
    }

    #[test]
    fn test_lesson_count_prefers_explicit_value() {
        let mut course = CourseMetadata {
            title: "C".to_string(),
            course_link: None,
            instructor: None,
            lessons: vec![LessonMetadata {
                lesson_number: 0,
                lesson_title: "Intro".to_string(),
                lesson_link: None,
            }],
            lesson_count: None,
        };
        assert_eq!(course.lesson_count(), 1);
        course.lesson_count = Some(4);
        assert_eq!(course.lesson_count(), 4);
        assert!(course.lesson(0).is_some());
        assert!(course.lesson(2).is_none());
    }
}
