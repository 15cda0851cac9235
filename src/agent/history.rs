//! Bounded conversation window for multi-turn sessions.

use std::collections::VecDeque;

/// Default number of exchanges kept.
pub const DEFAULT_MAX_HISTORY: usize = 2;

/// One user question and the assistant's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// User question.
    pub user: String,
    /// Assistant answer.
    pub assistant: String,
}

/// Keeps the last `max_exchanges` exchanges and flattens them into the
/// history string the orchestrator consumes.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    exchanges: VecDeque<Exchange>,
    max_exchanges: usize,
}

impl Default for SessionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl SessionHistory {
    /// Creates an empty window. A limit of zero keeps nothing.
    #[must_use]
    pub fn new(max_exchanges: usize) -> Self {
        Self {
            exchanges: VecDeque::with_capacity(max_exchanges),
            max_exchanges,
        }
    }

    /// Appends an exchange, evicting the oldest beyond the limit.
    pub fn add_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        if self.max_exchanges == 0 {
            return;
        }
        self.exchanges.push_back(Exchange {
            user: user.into(),
            assistant: assistant.into(),
        });
        while self.exchanges.len() > self.max_exchanges {
            self.exchanges.pop_front();
        }
    }

    /// Flattened `User: ...` / `Assistant: ...` lines, or `None` when empty.
    #[must_use]
    pub fn format(&self) -> Option<String> {
        if self.exchanges.is_empty() {
            return None;
        }
        let lines: Vec<String> = self
            .exchanges
            .iter()
            .flat_map(|e| {
                [
                    format!("User: {}", e.user),
                    format!("Assistant: {}", e.assistant),
                ]
            })
            .collect();
        Some(lines.join("\n"))
    }

    /// Drops every exchange.
    pub fn clear(&mut self) {
        self.exchanges.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// Exchanges oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter()
    }
}
