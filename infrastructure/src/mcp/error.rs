//! Error types for MCP stdio sessions

use stepwise_domain::ProviderError;
use thiserror::Error;

/// Result type alias for MCP operations
pub type Result<T> = std::result::Result<T, McpError>;

/// Errors that can occur when talking to an MCP server process
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Failed to spawn MCP server: {0}")]
    SpawnError(std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("JSON-RPC error (code {code}): {message}")]
    RpcError { code: i64, message: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Transport closed")]
    TransportClosed,
}

impl From<McpError> for ProviderError {
    fn from(err: McpError) -> Self {
        match err {
            McpError::CommandNotFound(_) => ProviderError::NotAvailable(err.to_string()),
            McpError::RpcError { .. } | McpError::UnexpectedResponse(_) => {
                ProviderError::DiscoveryFailed(err.to_string())
            }
            _ => ProviderError::TransportFailed(err.to_string()),
        }
    }
}
