//! Back-reference resolution for step arguments.
//!
//! A string argument may embed `{{tool_name}}` placeholders that stand for
//! the captured output of an earlier step. Resolution is two-phase:
//!
//! 1. [`extract_references`] lists every identifier in a value.
//! 2. [`resolve_value`] substitutes all identifiers found in the
//!    [`OutputHistory`] in one pass, returning [`Resolution::Unresolved`]
//!    with the identifiers that had no captured output.
//!
//! [`resolve_arguments`] lifts this to a whole argument map with
//! all-or-nothing semantics: a single unresolved field fails the step and
//! none of the rewritten fields are returned.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use super::history::OutputHistory;

/// `{{identifier}}`, identifier being everything up to the first `}}` on
/// the same line.
static REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("reference pattern is valid"));

/// Result of resolving one argument value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Every placeholder was substituted
    Resolved(String),
    /// Identifiers with no captured output, in first-occurrence order
    Unresolved(Vec<String>),
}

/// Result of resolving a step's full argument map
#[derive(Debug, Clone, PartialEq)]
pub enum StepResolution {
    /// Rewritten arguments, ready for dispatch
    Resolved(Map<String, Value>),
    /// Identifiers missing from the history across all fields
    Unresolved(Vec<String>),
}

impl StepResolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, StepResolution::Resolved(_))
    }
}

/// List the (trimmed) identifiers referenced by `value`, deduplicated, in
/// first-occurrence order.
pub fn extract_references(value: &str) -> Vec<String> {
    let mut refs: Vec<String> = Vec::new();
    for caps in REFERENCE.captures_iter(value) {
        let ident = caps[1].trim().to_string();
        if !refs.contains(&ident) {
            refs.push(ident);
        }
    }
    refs
}

/// Substitute every `{{identifier}}` found in `history`.
///
/// Values without placeholders come back unchanged.
pub fn resolve_value(value: &str, history: &OutputHistory) -> Resolution {
    let refs = extract_references(value);
    if refs.is_empty() {
        return Resolution::Resolved(value.to_string());
    }

    let missing: Vec<String> = refs
        .into_iter()
        .filter(|r| !history.contains(r))
        .collect();
    if !missing.is_empty() {
        return Resolution::Unresolved(missing);
    }

    let rewritten = REFERENCE.replace_all(value, |caps: &Captures<'_>| {
        history
            .get(caps[1].trim())
            .map(str::to_string)
            .unwrap_or_else(|| caps[0].to_string())
    });
    Resolution::Resolved(rewritten.into_owned())
}

/// Resolve every string argument of a step.
///
/// Non-string values pass through untouched.
pub fn resolve_arguments(arguments: &Map<String, Value>, history: &OutputHistory) -> StepResolution {
    let mut resolved = Map::with_capacity(arguments.len());
    let mut missing: Vec<String> = Vec::new();

    for (key, value) in arguments {
        match value {
            Value::String(s) => match resolve_value(s, history) {
                Resolution::Resolved(text) => {
                    resolved.insert(key.clone(), Value::String(text));
                }
                Resolution::Unresolved(refs) => {
                    for r in refs {
                        if !missing.contains(&r) {
                            missing.push(r);
                        }
                    }
                }
            },
            other => {
                resolved.insert(key.clone(), other.clone());
            }
        }
    }

    if missing.is_empty() {
        StepResolution::Resolved(resolved)
    } else {
        StepResolution::Unresolved(missing)
    }
}
