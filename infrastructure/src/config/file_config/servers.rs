//! MCP server definitions from TOML (`[[servers]]` entries)
//!
//! ```toml
//! [[servers]]
//! id = "mail"
//! command = "python"
//! args = ["mail_server.py"]
//! env = { SMTP_HOST = "smtp.example.com" }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::mcp::McpServerSpec;

/// One stdio MCP server; `id` becomes the provider id in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    pub id: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

impl FileServerConfig {
    pub fn to_spec(&self) -> McpServerSpec {
        McpServerSpec {
            id: self.id.clone(),
            command: self.command.clone(),
            args: self.args.clone(),
            env: self.env.clone(),
        }
    }
}
