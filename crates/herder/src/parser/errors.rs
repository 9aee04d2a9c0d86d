//! Errors — failure-line accumulation inside an open section.

use super::classify::{self, FAILURE_CATEGORIES};
use super::model::ErrorEntry;

/// Append-only buffer of failure lines seen while a section is open.
///
/// The parser never terminates on its own; the section parser drains it at
/// every section end. Draining is the exactly-once ownership transfer:
/// a second `drain()` with no intervening feeds returns an empty buffer.
#[derive(Debug, Default)]
pub struct ErrorParser {
    entries: Vec<ErrorEntry>,
}

impl ErrorParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the line if it carries any failure category.
    pub fn feed(&mut self, line: &str, lineno: u64) {
        let tags = classify::classify(line);
        if tags.iter().any(|t| FAILURE_CATEGORIES.contains(t)) {
            let (_, rest) = classify::strip_prefix(line);
            self.entries.push(ErrorEntry {
                linenumber: lineno,
                line: rest.trim_end().to_string(),
            });
        }
    }

    /// Take the buffered entries, resetting the buffer.
    pub fn drain(&mut self) -> Vec<ErrorEntry> {
        std::mem::take(&mut self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
