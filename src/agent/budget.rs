//! Adaptive response-length budgets.
//!
//! The budget for each backend call is a pure function of the query text
//! and the names of the tools used so far in the same query. Keyword lists
//! are compiled into case-insensitive, word-bounded patterns once, when the
//! [`BudgetPolicy`] is built.
//!
//! # Tier Selection
//!
//! | Condition (first match wins)            | Tier         | Default |
//! |-----------------------------------------|--------------|---------|
//! | query matches an outline keyword        | `Outline`    | 1500    |
//! | query matches a comparison keyword      | `Comparison` | 2500    |
//! | most recent tool was the outline tool   | `Outline`    | 1500    |
//! | any tool used                           | `Content`    | 1200    |
//! | otherwise                               | `General`    | 1000    |

use regex::Regex;

use crate::error::AgentError;

/// Name of the tool whose use promotes a query to the outline tier.
pub const OUTLINE_TOOL_NAME: &str = "get_course_outline";

/// Default outline-intent keywords.
pub const DEFAULT_OUTLINE_KEYWORDS: &[&str] =
    &["outline", "structure", "lesson list", "syllabus", "what lessons"];

/// Default comparison-intent keywords.
pub const DEFAULT_COMPARISON_KEYWORDS: &[&str] = &[
    "compare",
    "comparison",
    "versus",
    "vs",
    "difference",
    "differ",
    "contrast",
];

/// Response-length tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseTier {
    /// No tools, no special intent.
    General,
    /// Answer built from retrieved content.
    Content,
    /// Course structure listing.
    Outline,
    /// Side-by-side comparison.
    Comparison,
}

impl std::fmt::Display for ResponseTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::General => write!(f, "general"),
            Self::Content => write!(f, "content"),
            Self::Outline => write!(f, "outline"),
            Self::Comparison => write!(f, "comparison"),
        }
    }
}

/// Token ceilings per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudgets {
    /// Outline tier.
    pub outline: u32,
    /// Comparison tier.
    pub comparison: u32,
    /// Content tier.
    pub content: u32,
    /// General tier.
    pub general: u32,
}

impl Default for TokenBudgets {
    fn default() -> Self {
        Self {
            outline: 1500,
            comparison: 2500,
            content: 1200,
            general: 1000,
        }
    }
}

impl TokenBudgets {
    /// Ceiling for the given tier.
    #[must_use]
    pub const fn for_tier(&self, tier: ResponseTier) -> u32 {
        match tier {
            ResponseTier::General => self.general,
            ResponseTier::Content => self.content,
            ResponseTier::Outline => self.outline,
            ResponseTier::Comparison => self.comparison,
        }
    }
}

/// A selected tier and its token ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    /// Selected tier.
    pub tier: ResponseTier,
    /// Maximum tokens for the call.
    pub max_tokens: u32,
}

/// Compiled budget selection rules.
#[derive(Debug, Clone)]
pub struct BudgetPolicy {
    outline: Option<Regex>,
    comparison: Option<Regex>,
    budgets: TokenBudgets,
}

impl Default for BudgetPolicy {
    fn default() -> Self {
        Self {
            outline: keyword_pattern(DEFAULT_OUTLINE_KEYWORDS).ok().flatten(),
            comparison: keyword_pattern(DEFAULT_COMPARISON_KEYWORDS)
                .ok()
                .flatten(),
            budgets: TokenBudgets::default(),
        }
    }
}

impl BudgetPolicy {
    /// Builds a policy from keyword lists and budgets.
    ///
    /// Multi-word keywords match any run of whitespace between their words.
    /// An empty list never matches.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] if a keyword list cannot be compiled.
    pub fn new<S: AsRef<str>>(
        outline_keywords: &[S],
        comparison_keywords: &[S],
        budgets: TokenBudgets,
    ) -> Result<Self, AgentError> {
        Ok(Self {
            outline: keyword_pattern(outline_keywords)?,
            comparison: keyword_pattern(comparison_keywords)?,
            budgets,
        })
    }

    /// Default keywords with custom budgets.
    #[must_use]
    pub fn with_budgets(budgets: TokenBudgets) -> Self {
        Self {
            budgets,
            ..Self::default()
        }
    }

    /// The configured ceilings.
    #[must_use]
    pub const fn budgets(&self) -> &TokenBudgets {
        &self.budgets
    }

    /// Selects the tier for a query given the tools used so far.
    #[must_use]
    pub fn tier<S: AsRef<str>>(&self, query: &str, tools_used: &[S]) -> ResponseTier {
        let matches = |re: &Option<Regex>| re.as_ref().is_some_and(|r| r.is_match(query));

        if matches(&self.outline) {
            ResponseTier::Outline
        } else if matches(&self.comparison) {
            ResponseTier::Comparison
        } else if tools_used
            .last()
            .is_some_and(|t| t.as_ref() == OUTLINE_TOOL_NAME)
        {
            ResponseTier::Outline
        } else if tools_used.is_empty() {
            ResponseTier::General
        } else {
            ResponseTier::Content
        }
    }

    /// Selects the tier and its token ceiling.
    #[must_use]
    pub fn select<S: AsRef<str>>(&self, query: &str, tools_used: &[S]) -> Budget {
        let tier = self.tier(query, tools_used);
        Budget {
            tier,
            max_tokens: self.budgets.for_tier(tier),
        }
    }
}

/// Compiles a keyword list into one word-bounded, case-insensitive pattern.
fn keyword_pattern<S: AsRef<str>>(keywords: &[S]) -> Result<Option<Regex>, AgentError> {
    let alternatives: Vec<String> = keywords
        .iter()
        .map(|k| {
            k.as_ref()
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .filter(|k| !k.is_empty())
        .collect();

    if alternatives.is_empty() {
        return Ok(None);
    }

    let pattern = format!(r"(?i)\b(?:{})\b", alternatives.join("|"));
    Regex::new(&pattern)
        .map(Some)
        .map_err(|e| AgentError::Config {
            message: format!("invalid budget keyword pattern: {e}"),
        })
}
