//! Relevance verdicts.

use serde::{Deserialize, Serialize};

/// Whether a step's output may be used as context for the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Admissible,
    NotAdmissible,
}

impl Verdict {
    /// Parse a classifier label.
    ///
    /// Only `True` (surrounding whitespace and ASCII case ignored) is
    /// admissible; anything else, malformed replies included, rejects.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("true") {
            Verdict::Admissible
        } else {
            Verdict::NotAdmissible
        }
    }

    pub fn is_admissible(&self) -> bool {
        matches!(self, Verdict::Admissible)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Admissible => "admissible",
            Verdict::NotAdmissible => "not_admissible",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
