//! Builtin provider toggles from TOML (`[builtin]` section)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBuiltinConfig {
    /// Master switch for all builtin providers
    pub enabled: bool,
    /// `filesystem` provider (create/read/write/append/delete file)
    pub filesystem: bool,
    /// `utility` provider (get_time, calculate)
    pub utility: bool,
}

impl Default for FileBuiltinConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            filesystem: true,
            utility: true,
        }
    }
}

impl FileBuiltinConfig {
    pub fn filesystem_enabled(&self) -> bool {
        self.enabled && self.filesystem
    }

    pub fn utility_enabled(&self) -> bool {
        self.enabled && self.utility
    }
}
