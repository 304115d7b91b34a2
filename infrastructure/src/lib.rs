//! Infrastructure layer for stepwise
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the OpenAI-compatible LLM gateway, tool
//! provider sessions (builtin and MCP), the tool registry, configuration
//! file loading and conversation logging.

pub mod config;
pub mod llm;
pub mod logging;
pub mod mcp;
pub mod tools;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileBuiltinConfig, FileConfig, FileExecutionConfig,
    FileLlmConfig, FileLoggingConfig, FileNormalizationConfig, FileReplConfig, FileServerConfig,
};
pub use llm::{OpenAiConfig, OpenAiGateway};
pub use logging::JsonlConversationLogger;
pub use mcp::{McpError, McpServerSpec, McpStdioProvider};
pub use tools::{FilesystemProvider, RegistryStats, ToolRegistry, UtilityProvider};
