//! Tool catalog: name → provider session bindings.

use std::collections::HashMap;

use thiserror::Error;

use super::entities::ToolDescriptor;

/// Errors from catalog lookups
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Tool not found: {0}")]
    NotFound(String),
}

/// One name → provider binding created by [`ToolCatalog::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolBinding {
    pub name: String,
    pub provider_id: String,
}

/// Binds each tool name to the provider session that serves it.
///
/// Registration is last-write-wins: when two providers advertise the same
/// tool name, the later registration owns the binding.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    bindings: HashMap<String, String>,
    descriptors: HashMap<String, ToolDescriptor>,
    /// Names in first-registration order, for stable planner prompts
    order: Vec<String>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind every descriptor to `provider_id`.
    ///
    /// Returns the bindings created, in descriptor order, so callers can
    /// print a registration trace.
    pub fn register(
        &mut self,
        provider_id: &str,
        descriptors: Vec<ToolDescriptor>,
    ) -> Vec<ToolBinding> {
        let mut created = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let name = descriptor.name.clone();
            if !self.descriptors.contains_key(&name) {
                self.order.push(name.clone());
            }
            self.bindings.insert(name.clone(), provider_id.to_string());
            self.descriptors.insert(name.clone(), descriptor);
            created.push(ToolBinding {
                name,
                provider_id: provider_id.to_string(),
            });
        }
        created
    }

    /// Provider id bound to `name`
    pub fn resolve(&self, name: &str) -> Result<&str, CatalogError> {
        self.bindings
            .get(name)
            .map(|s| s.as_str())
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    /// Descriptor registered for `name`
    pub fn describe(&self, name: &str) -> Result<&ToolDescriptor, CatalogError> {
        self.descriptors
            .get(name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// All descriptors, in first-registration order
    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.order.iter().filter_map(|n| self.descriptors.get(n))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
