//! LLM Gateway port
//!
//! Defines the interface for communicating with chat-completion providers.
//! The chain engine uses it three ways: planning, relevance judgment and
//! final synthesis.

use async_trait::async_trait;
use stepwise_domain::Message;
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Gateway for LLM communication
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send a full message history and return the reply text
    async fn complete(&self, messages: &[Message], model: &str) -> Result<String, GatewayError>;
}
