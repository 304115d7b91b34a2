//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into domain/application
//! types where those exist.

mod builtin;
mod execution;
mod llm;
mod logging;
mod normalization;
mod repl;
mod servers;

pub use builtin::FileBuiltinConfig;
pub use execution::FileExecutionConfig;
pub use llm::FileLlmConfig;
pub use logging::FileLoggingConfig;
pub use normalization::{FileNormalizationConfig, FilePathRule};
pub use repl::FileReplConfig;
pub use servers::FileServerConfig;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Problems detected by [`FileConfig::validate`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("llm.model cannot be empty")]
    EmptyModelName,

    #[error("llm.timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("execution.max_attempts_per_step cannot be 0 (set unbounded_retry = true to retry forever)")]
    InvalidMaxAttempts,

    #[error("normalization.rules[{index}] needs a provider or a tool")]
    RuleWithoutSelector { index: usize },

    #[error("normalization.rules[{index}] has an empty argument name")]
    RuleWithoutArgument { index: usize },

    #[error("servers[{index}] needs an id and a command")]
    IncompleteServer { index: usize },

    #[error("server id '{id}' is defined more than once")]
    DuplicateServerId { id: String },
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Chat completions endpoint
    pub llm: FileLlmConfig,
    /// Execution loop control
    pub execution: FileExecutionConfig,
    /// Path anchoring rules
    pub normalization: FileNormalizationConfig,
    /// Builtin provider toggles
    pub builtin: FileBuiltinConfig,
    /// External MCP servers
    pub servers: Vec<FileServerConfig>,
    /// Log destinations
    pub logging: FileLoggingConfig,
    /// REPL settings
    pub repl: FileReplConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();

        if self.llm.model.trim().is_empty() {
            issues.push(ConfigValidationError::EmptyModelName);
        }
        if self.llm.timeout_seconds == 0 {
            issues.push(ConfigValidationError::InvalidTimeout);
        }
        if !self.execution.unbounded_retry && self.execution.max_attempts_per_step == 0 {
            issues.push(ConfigValidationError::InvalidMaxAttempts);
        }

        for (index, rule) in self.normalization.rules.iter().enumerate() {
            if !rule.has_selector() {
                issues.push(ConfigValidationError::RuleWithoutSelector { index });
            }
            if rule.argument.trim().is_empty() {
                issues.push(ConfigValidationError::RuleWithoutArgument { index });
            }
        }

        let mut seen = HashSet::new();
        for (index, server) in self.servers.iter().enumerate() {
            if server.id.trim().is_empty() || server.command.trim().is_empty() {
                issues.push(ConfigValidationError::IncompleteServer { index });
                continue;
            }
            if !seen.insert(server.id.as_str()) {
                issues.push(ConfigValidationError::DuplicateServerId {
                    id: server.id.clone(),
                });
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[llm]
base_url = "https://api.deepseek.com/v1"
model = "deepseek-chat"
api_key_env = "DEEPSEEK_API_KEY"
timeout_seconds = 60

[execution]
max_attempts_per_step = 5
stop_when_stalled = false
arithmetic_tools = ["calculate", "eval"]

[normalization]
base_dir = "/srv/files"

[[normalization.rules]]
provider = "storage"
argument = "path"

[builtin]
filesystem = false

[[servers]]
id = "mail"
command = "python"
args = ["Server_main.py"]

[[servers]]
id = "web"
command = "python"
args = ["Server_web_brower.py"]
env = { SEARCH_API_KEY = "abc" }

[logging]
conversation_log = "/tmp/stepwise.jsonl"

[repl]
show_progress = false
history_file = "~/.local/share/stepwise/history.txt"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.model, "deepseek-chat");
        assert_eq!(config.llm.timeout_seconds, 60);
        assert_eq!(config.execution.max_attempts_per_step, 5);
        assert!(!config.execution.stop_when_stalled);
        assert_eq!(config.normalization.rules.len(), 1);
        assert!(!config.builtin.filesystem_enabled());
        assert!(config.builtin.utility_enabled());
        assert_eq!(config.servers.len(), 2);
        assert_eq!(config.servers[1].env["SEARCH_API_KEY"], "abc");
        assert!(!config.repl.show_progress);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config, FileConfig::default());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_reports_every_issue() {
        let mut config = FileConfig::default();
        config.llm.model = " ".to_string();
        config.llm.timeout_seconds = 0;
        config.execution.max_attempts_per_step = 0;
        config.normalization.rules.push(FilePathRule {
            argument: "path".to_string(),
            ..Default::default()
        });
        config.servers.push(FileServerConfig {
            id: "a".to_string(),
            command: "x".to_string(),
            ..Default::default()
        });
        config.servers.push(FileServerConfig {
            id: "a".to_string(),
            command: "y".to_string(),
            ..Default::default()
        });

        let issues = config.validate();
        assert_eq!(
            issues,
            vec![
                ConfigValidationError::EmptyModelName,
                ConfigValidationError::InvalidTimeout,
                ConfigValidationError::InvalidMaxAttempts,
                ConfigValidationError::RuleWithoutSelector { index: 0 },
                ConfigValidationError::DuplicateServerId {
                    id: "a".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_zero_attempts_allowed_when_unbounded() {
        let mut config = FileConfig::default();
        config.execution.max_attempts_per_step = 0;
        config.execution.unbounded_retry = true;
        assert!(config.validate().is_empty());
    }
}
