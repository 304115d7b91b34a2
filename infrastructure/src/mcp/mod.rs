//! MCP (Model Context Protocol) stdio provider sessions
//!
//! - [`McpStdioProvider`]: one spawned server process, implementing
//!   [`ToolProvider`](stepwise_domain::ToolProvider)
//! - [`protocol`]: JSON-RPC message types
//! - [`McpError`]: transport and protocol failures

mod error;
pub mod protocol;
mod provider;

pub use error::McpError;
pub use provider::{McpServerSpec, McpStdioProvider};
