//! Declarative argument normalization.
//!
//! Path-bearing arguments are anchored under a base directory before
//! dispatch. Which arguments count as paths is described by [`PathRule`]s
//! rather than hardcoded tool names.

use std::path::{Component, Path, PathBuf};

use serde_json::{Map, Value};

/// Selects one argument of matching calls for path anchoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRule {
    /// Match calls bound to this provider id
    pub provider: Option<String>,
    /// Match calls to this tool name
    pub tool: Option<String>,
    /// Argument holding the path
    pub argument: String,
    /// Inserted when the argument is missing
    pub default: Option<String>,
    /// Value meaning "no path", left untouched
    pub skip_value: Option<String>,
}

impl PathRule {
    pub fn for_provider(provider: impl Into<String>, argument: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            tool: None,
            argument: argument.into(),
            default: None,
            skip_value: None,
        }
    }

    pub fn for_tool(tool: impl Into<String>, argument: impl Into<String>) -> Self {
        Self {
            provider: None,
            tool: Some(tool.into()),
            argument: argument.into(),
            default: None,
            skip_value: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_skip_value(mut self, skip: impl Into<String>) -> Self {
        self.skip_value = Some(skip.into());
        self
    }

    /// True when either selector matches
    pub fn applies_to(&self, tool: &str, provider_id: &str) -> bool {
        self.provider.as_deref() == Some(provider_id) || self.tool.as_deref() == Some(tool)
    }
}

/// Base directory plus the rules that anchor paths under it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationPolicy {
    pub base_dir: Option<PathBuf>,
    pub rules: Vec<PathRule>,
}

impl NormalizationPolicy {
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self {
            base_dir,
            rules: Vec::new(),
        }
    }

    /// Rules for the stock providers: `file_name` on the filesystem
    /// provider (default `temp.txt`), and `send_email`'s attachment unless
    /// it is `noattach`.
    pub fn standard(base_dir: Option<PathBuf>) -> Self {
        Self::new(base_dir)
            .with_rule(PathRule::for_provider("filesystem", "file_name").with_default("temp.txt"))
            .with_rule(
                PathRule::for_tool("send_email", "attachmentfilename").with_skip_value("noattach"),
            )
    }

    pub fn with_rule(mut self, rule: PathRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Apply every matching rule to `arguments` in place.
    ///
    /// Returns the names of the arguments that were inserted or rewritten.
    pub fn apply(
        &self,
        tool: &str,
        provider_id: &str,
        arguments: &mut Map<String, Value>,
    ) -> Vec<String> {
        let mut touched = Vec::new();
        for rule in self.rules.iter().filter(|r| r.applies_to(tool, provider_id)) {
            let mut inserted = false;
            if !arguments.contains_key(&rule.argument) {
                let Some(default) = &rule.default else {
                    continue;
                };
                arguments.insert(rule.argument.clone(), Value::String(default.clone()));
                inserted = true;
            }

            let Some(Value::String(current)) = arguments.get(&rule.argument) else {
                continue;
            };
            if rule.skip_value.as_deref() == Some(current.as_str()) {
                continue;
            }
            let anchored = self.anchor(current);
            if inserted || anchored != *current {
                arguments.insert(rule.argument.clone(), Value::String(anchored));
                touched.push(rule.argument.clone());
            }
        }
        touched.dedup();
        touched
    }

    /// Re-root `value` under the base directory unless it is already there.
    ///
    /// Root, prefix, `.` and `..` components are dropped, so the result
    /// never leaves the base.
    pub fn anchor(&self, value: &str) -> String {
        let Some(base) = &self.base_dir else {
            return value.to_string();
        };
        let path = Path::new(value);
        if path.starts_with(base) {
            return value.to_string();
        }
        let relative: PathBuf = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part),
                _ => None,
            })
            .collect();
        base.join(relative).to_string_lossy().into_owned()
    }
}
