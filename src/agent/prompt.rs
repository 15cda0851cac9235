//! System prompt for the course assistant and its history suffix.
//!
//! The compiled-in prompt can be overridden by a `system.md` file in the
//! prompt directory; `course-rag init-prompts` scaffolds that file.

use std::path::{Path, PathBuf};

/// Compiled-in system prompt for the course assistant.
pub const SYSTEM_PROMPT: &str = r#"You are an AI assistant specialized in course materials and educational content, with access to tools for course information.

## Available Tools

- **search_course_content**: Search lesson content for specific topics, explanations and details. Optional filters narrow the search to one course (partial names work) or one lesson number.
- **get_course_outline**: Get a course's title, link, instructor and complete lesson list. Use it for questions about course structure, outlines, syllabi or which lessons a course has.

## Tool Usage

- Use a tool only for questions about specific course content or course structure.
- You may make further rounds of tool calls when a follow-up lookup is genuinely needed (for example, outline first, then the content of one lesson); the number of rounds is limited, so make each call count.
- For outline questions, return the course title, course link and every lesson's number and title.
- Synthesize tool results into accurate, fact-based answers.
- If a tool yields no results, say so clearly without offering alternatives.

## Response Protocol

- **General knowledge questions**: answer from existing knowledge without tools.
- **Course-specific questions**: use the tools first, then answer.
- **No meta-commentary**: give direct answers only. Do not describe your reasoning or your searches and do not say "based on the search results".

All responses must be:
1. **Brief, concise and focused**: get to the point quickly.
2. **Educational**: maintain instructional value.
3. **Clear**: use accessible language.
4. **Example-supported**: include relevant examples when they aid understanding.

Provide only the direct answer to what was asked."#;

/// Separator between the static prompt and the conversation history.
pub const HISTORY_HEADER: &str = "\n\nPrevious conversation:\n";

/// Default prompt directory under the user's home.
const DEFAULT_PROMPT_DIR: &str = ".config/course-rag/prompts";

/// Filename of the system prompt template.
const SYSTEM_FILENAME: &str = "system.md";

/// The prompts used by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    /// Static system instructions.
    pub system: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::defaults()
    }
}

impl PromptSet {
    /// Loads prompts from the given directory, falling back to compiled-in defaults.
    ///
    /// Resolution order for `prompt_dir`:
    /// 1. Explicit `prompt_dir` argument
    /// 2. `COURSE_RAG_PROMPT_DIR` environment variable
    /// 3. `~/.config/course-rag/prompts/`
    ///
    /// A missing or empty file uses the default.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir
            .map(PathBuf::from)
            .or_else(|| std::env::var("COURSE_RAG_PROMPT_DIR").ok().map(PathBuf::from))
            .or_else(Self::default_dir);

        let system = resolved_dir
            .map(|dir| dir.join(SYSTEM_FILENAME))
            .and_then(|path| std::fs::read_to_string(path).ok())
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| SYSTEM_PROMPT.to_string());

        Self { system }
    }

    /// Returns compiled-in defaults without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            system: SYSTEM_PROMPT.to_string(),
        }
    }

    /// Writes the compiled-in default prompts to the given directory.
    ///
    /// Creates the directory if it does not exist. Existing files are
    /// **not** overwritten.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        let path = dir.join(SYSTEM_FILENAME);
        if !path.exists() {
            std::fs::write(&path, SYSTEM_PROMPT)?;
            written.push(path);
        }
        Ok(written)
    }

    /// Returns the default prompt directory under the user's home.
    ///
    /// Returns `None` if the home directory cannot be determined.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR))
    }

    /// Builds the system prompt for one query.
    ///
    /// Non-empty history is appended after [`HISTORY_HEADER`].
    #[must_use]
    pub fn build_system_prompt(&self, history: Option<&str>) -> String {
        match history.filter(|h| !h.is_empty()) {
            Some(history) => format!("{}{HISTORY_HEADER}{history}", self.system),
            None => self.system.clone(),
        }
    }
}
