//! In-memory course catalog.
//!
//! Scores passages by how many distinct query terms they contain. Terms are
//! lowercased Unicode words minus a short stopword list. This is keyword
//! overlap, not embedding similarity, and is meant for local use and tests.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use super::{ChunkMetadata, CourseMetadata, RetrievalService, SearchResults};
use crate::error::CatalogError;

/// Default number of passages returned by one search.
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Words ignored when scoring and resolving.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "do", "does", "for", "from", "how",
    "i", "in", "is", "it", "me", "of", "on", "or", "the", "this", "to", "what", "which", "with",
];

/// On-disk catalog layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    /// Course metadata.
    #[serde(default)]
    pub courses: Vec<CourseMetadata>,
    /// Lesson passages.
    #[serde(default)]
    pub chunks: Vec<CatalogChunk>,
}

/// One passage as stored in the catalog file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogChunk {
    /// Title of the owning course.
    pub course_title: String,
    /// Owning lesson, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_number: Option<u32>,
    /// Position within the course.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<u32>,
    /// Passage text.
    pub content: String,
}

#[derive(Debug, Clone)]
struct IndexedChunk {
    chunk: CatalogChunk,
    terms: HashSet<String>,
}

/// Courses and passages held in memory.
#[derive(Debug, Clone)]
pub struct CourseCatalog {
    courses: Vec<CourseMetadata>,
    chunks: Vec<IndexedChunk>,
    max_results: usize,
}

impl CourseCatalog {
    /// Builds a catalog from its file representation.
    #[must_use]
    pub fn new(file: CatalogFile) -> Self {
        let chunks = file
            .chunks
            .into_iter()
            .map(|chunk| IndexedChunk {
                terms: terms(&chunk.content),
                chunk,
            })
            .collect();
        Self {
            courses: file.courses,
            chunks,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Loads a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read and
    /// [`CatalogError::Parse`] if it is not a valid catalog.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let shown = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: shown.clone(),
            source,
        })?;
        let file: CatalogFile =
            serde_json::from_str(&text).map_err(|source| CatalogError::Parse {
                path: shown.clone(),
                source,
            })?;
        debug!(
            path = %shown,
            courses = file.courses.len(),
            chunks = file.chunks.len(),
            "loaded course catalog"
        );
        Ok(Self::new(file))
    }

    /// Sets the number of passages returned by one search.
    #[must_use]
    pub const fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Courses in catalog order.
    #[must_use]
    pub fn courses(&self) -> &[CourseMetadata] {
        &self.courses
    }

    /// Number of passages.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    fn course(&self, title: &str) -> Option<&CourseMetadata> {
        self.courses.iter().find(|c| c.title == title)
    }
}

impl RetrievalService for CourseCatalog {
    fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> SearchResults {
        let course_title = match course_name {
            Some(name) => match self.resolve_course_name(name) {
                Some(title) => Some(title),
                None => return SearchResults::error(format!("No course found matching '{name}'")),
            },
            None => None,
        };

        let query_terms = terms(query);
        let mut scored: Vec<(usize, &IndexedChunk)> = self
            .chunks
            .iter()
            .filter(|c| {
                course_title
                    .as_deref()
                    .is_none_or(|t| c.chunk.course_title == t)
            })
            .filter(|c| lesson_number.is_none_or(|n| c.chunk.lesson_number == Some(n)))
            .map(|c| (query_terms.intersection(&c.terms).count(), c))
            .filter(|(score, _)| *score > 0)
            .collect();
        // Stable: equal scores keep catalog order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        SearchResults::from_hits(
            scored
                .into_iter()
                .take(self.max_results)
                .map(|(_, c)| {
                    (
                        c.chunk.content.clone(),
                        ChunkMetadata {
                            course_title: c.chunk.course_title.clone(),
                            lesson_number: c.chunk.lesson_number,
                            chunk_index: c.chunk.chunk_index,
                        },
                    )
                })
                .collect(),
        )
    }

    fn resolve_course_name(&self, partial: &str) -> Option<String> {
        let needle = partial.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        if let Some(c) = self.courses.iter().find(|c| c.title.to_lowercase() == needle) {
            return Some(c.title.clone());
        }
        if let Some(c) = self.courses.iter().find(|c| {
            let title = c.title.to_lowercase();
            title.contains(&needle) || needle.contains(&title)
        }) {
            return Some(c.title.clone());
        }

        let needle_terms = terms(&needle);
        let mut best: Option<(usize, &CourseMetadata)> = None;
        for course in &self.courses {
            let overlap = needle_terms.intersection(&terms(&course.title)).count();
            if overlap > 0 && best.is_none_or(|(score, _)| overlap > score) {
                best = Some((overlap, course));
            }
        }
        best.map(|(_, c)| c.title.clone())
    }

    fn get_source_link(&self, course_title: &str, lesson_number: Option<u32>) -> Option<String> {
        let course = self.course(course_title)?;
        lesson_number
            .and_then(|n| course.lesson(n))
            .and_then(|l| l.lesson_link.clone())
            .or_else(|| course.course_link.clone())
    }

    fn list_course_metadata(&self) -> Vec<CourseMetadata> {
        self.courses.clone()
    }
}

/// Lowercased, stopword-free Unicode words of `text`.
fn terms(text: &str) -> HashSet<String> {
    text.unicode_words()
        .map(str::to_lowercase)
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .collect()
}
