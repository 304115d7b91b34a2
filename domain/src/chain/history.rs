//! Captured step outputs available as back-references.

use std::collections::HashMap;

/// Tool name → last accepted output text.
///
/// Keyed by tool name only: a second accepted invocation of the same tool
/// replaces the first one's entry.
#[derive(Debug, Clone, Default)]
pub struct OutputHistory {
    entries: HashMap<String, String>,
}

impl OutputHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted output, returning the entry it replaced.
    pub fn record(&mut self, tool_name: impl Into<String>, output: impl Into<String>) -> Option<String> {
        self.entries.insert(tool_name.into(), output.into())
    }

    pub fn get(&self, tool_name: &str) -> Option<&str> {
        self.entries.get(tool_name).map(|s| s.as_str())
    }

    pub fn contains(&self, tool_name: &str) -> bool {
        self.entries.contains_key(tool_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
