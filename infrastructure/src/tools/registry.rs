//! Tool Registry
//!
//! The [`ToolRegistry`] aggregates provider sessions and implements
//! [`ToolExecutorPort`]. It discovers each session's tools into a
//! [`ToolCatalog`] and routes invocations to the session a tool is bound to.
//!
//! # Usage
//!
//! ```ignore
//! use stepwise_infrastructure::tools::{FilesystemProvider, ToolRegistry, UtilityProvider};
//!
//! let mut registry = ToolRegistry::new()
//!     .register(FilesystemProvider::new())
//!     .register(UtilityProvider::new());
//!
//! // Bindings come back in registration order for the startup trace
//! let bindings = registry.discover().await;
//!
//! let out = registry.invoke("utility", "calculate", &args).await?;
//! ```
//!
//! # Name collisions
//!
//! Sessions are discovered in registration order and the catalog is
//! last-write-wins, so a later session that advertises an existing tool
//! name takes the binding over.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use stepwise_application::ports::tool_executor::ToolExecutorPort;
use stepwise_domain::{ProviderError, ToolBinding, ToolCatalog, ToolProvider};

/// Tool registry that aggregates provider sessions
pub struct ToolRegistry {
    /// Registered sessions, in registration order
    providers: Vec<Arc<dyn ToolProvider>>,
    /// Tool name -> provider id (filled by discovery)
    catalog: ToolCatalog,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            catalog: ToolCatalog::new(),
        }
    }

    /// Register a provider session
    pub fn register<P: ToolProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Register a provider session (Arc version)
    pub fn register_arc(mut self, provider: Arc<dyn ToolProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Discover tools from every session and rebuild the catalog.
    ///
    /// A session whose listing fails is skipped with a warning. Returns every
    /// binding made, in order, including ones later overridden.
    pub async fn discover(&mut self) -> Vec<ToolBinding> {
        let mut catalog = ToolCatalog::new();
        let mut bindings = Vec::new();

        for provider in &self.providers {
            match provider.list_tools().await {
                Ok(tools) => {
                    for tool in &tools {
                        if catalog.contains(&tool.name) {
                            tracing::debug!(
                                tool = %tool.name,
                                provider = provider.id(),
                                "Tool name rebound to later provider"
                            );
                        }
                    }
                    let created = catalog.register(provider.id(), tools);
                    tracing::debug!(
                        provider = provider.id(),
                        count = created.len(),
                        "Registered tools"
                    );
                    bindings.extend(created);
                }
                Err(e) => {
                    tracing::warn!(
                        provider = provider.id(),
                        error = %e,
                        "Failed to list tools from provider"
                    );
                }
            }
        }

        self.catalog = catalog;
        bindings
    }

    fn provider(&self, provider_id: &str) -> Option<&Arc<dyn ToolProvider>> {
        self.providers.iter().find(|p| p.id() == provider_id)
    }

    /// Get a list of registered provider IDs
    pub fn provider_ids(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    /// Get statistics about registered tools
    pub fn stats(&self) -> RegistryStats {
        let mut tools_per_provider = HashMap::new();
        for name in self.catalog.names() {
            if let Ok(provider_id) = self.catalog.resolve(name) {
                *tools_per_provider.entry(provider_id.to_string()).or_insert(0) += 1;
            }
        }

        RegistryStats {
            total_providers: self.providers.len(),
            total_tools: self.catalog.len(),
            tools_per_provider,
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the registry
#[derive(Debug, Clone)]
pub struct RegistryStats {
    pub total_providers: usize,
    pub total_tools: usize,
    pub tools_per_provider: HashMap<String, usize>,
}

#[async_trait]
impl ToolExecutorPort for ToolRegistry {
    fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    async fn invoke(
        &self,
        provider_id: &str,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<String, ProviderError> {
        match self.provider(provider_id) {
            Some(provider) => provider.invoke(name, arguments).await,
            None => Err(ProviderError::NotAvailable(provider_id.to_string())),
        }
    }
}
