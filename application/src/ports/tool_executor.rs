//! Tool Executor port
//!
//! Gives the application layer the tool catalog and a way to dispatch a call
//! to the provider session a tool is bound to.

use async_trait::async_trait;
use serde_json::{Map, Value};
use stepwise_domain::{ProviderError, ToolCatalog};

/// Port for tool execution
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ToolExecutorPort: Send + Sync {
    /// Name → provider bindings of every discovered tool
    fn catalog(&self) -> &ToolCatalog;

    /// Check if a tool is available
    fn has_tool(&self, name: &str) -> bool {
        self.catalog().contains(name)
    }

    /// Invoke `name` on the provider session `provider_id`.
    ///
    /// Tool-level failures come back as error-marked text; `Err` means the
    /// session itself could not be reached.
    async fn invoke(
        &self,
        provider_id: &str,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<String, ProviderError>;
}
