//! Argument normalization from TOML (`[normalization]` section)
//!
//! ```toml
//! [normalization]
//! base_dir = "/srv/stepwise/files"
//!
//! [[normalization.rules]]
//! tool = "upload"
//! argument = "path"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use stepwise_domain::{NormalizationPolicy, PathRule};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileNormalizationConfig {
    /// Directory path-bearing arguments are anchored under
    pub base_dir: Option<String>,
    /// Include the rules for the stock filesystem and email tools
    pub standard_rules: bool,
    /// Additional rules
    pub rules: Vec<FilePathRule>,
}

impl Default for FileNormalizationConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            standard_rules: true,
            rules: Vec::new(),
        }
    }
}

/// One `[[normalization.rules]]` entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePathRule {
    pub provider: Option<String>,
    pub tool: Option<String>,
    pub argument: String,
    pub default: Option<String>,
    pub skip_value: Option<String>,
}

impl FilePathRule {
    pub fn has_selector(&self) -> bool {
        self.provider.is_some() || self.tool.is_some()
    }
}

impl From<&FilePathRule> for PathRule {
    fn from(rule: &FilePathRule) -> Self {
        PathRule {
            provider: rule.provider.clone(),
            tool: rule.tool.clone(),
            argument: rule.argument.clone(),
            default: rule.default.clone(),
            skip_value: rule.skip_value.clone(),
        }
    }
}

impl FileNormalizationConfig {
    /// Build the policy, with `base_dir_override` taking precedence over
    /// the configured base directory.
    pub fn to_policy(&self, base_dir_override: Option<PathBuf>) -> NormalizationPolicy {
        let base_dir = base_dir_override.or_else(|| self.base_dir.as_ref().map(PathBuf::from));
        let policy = if self.standard_rules {
            NormalizationPolicy::standard(base_dir)
        } else {
            NormalizationPolicy::new(base_dir)
        };
        self.rules
            .iter()
            .fold(policy, |policy, rule| policy.with_rule(rule.into()))
    }
}
