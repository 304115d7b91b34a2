//! Tool provider abstraction
//!
//! A [`ToolProvider`] is one independently addressable provider session: an
//! MCP server process, or one of the builtin providers. Each advertises a set
//! of [`ToolDescriptor`]s and answers invocations with plain text.
//!
//! ```text
//! ┌──────────────┐  list_tools()   ┌──────────────┐
//! │ ToolRegistry │ ──────────────▶ │ ToolProvider │  "filesystem", "utility",
//! │ (catalog)    │ ◀────────────── │  (session)   │  "mail", ...
//! └──────────────┘  invoke() text  └──────────────┘
//! ```
//!
//! # Error signalling
//!
//! Tool-level failures are **not** a distinct channel: a provider reports them
//! inside the returned text (see [`super::output::carries_error_marker`]).
//! [`ProviderError`] is reserved for transport failures: the session could
//! not be reached at all.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use super::entities::ToolDescriptor;

/// Error type for tool provider operations
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider is not available (e.g., server command not installed)
    #[error("Provider not available: {0}")]
    NotAvailable(String),

    /// Failed to list tools from the provider
    #[error("Discovery failed: {0}")]
    DiscoveryFailed(String),

    /// The request could not be delivered or the session died mid-call
    #[error("Transport failed: {0}")]
    TransportFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Tool provider session
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Unique identifier for this provider session
    ///
    /// Examples: "filesystem", "utility", or a configured MCP server id
    fn id(&self) -> &str;

    /// List the tools this session serves
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ProviderError>;

    /// Invoke a tool, returning its textual result
    ///
    /// Tool failures come back as `Ok` text carrying an error marker.
    async fn invoke(&self, name: &str, arguments: &Map<String, Value>)
    -> Result<String, ProviderError>;
}
