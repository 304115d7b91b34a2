//! Tool domain module
//!
//! Defines how the chain engine sees tools: as [`ToolDescriptor`]s advertised
//! by [`ToolProvider`] sessions, bound by name in a [`ToolCatalog`], and
//! invoked through [`PlanStep`]s proposed by the planner.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ ToolProvider │───▶│ ToolCatalog  │───▶│ PlanStep     │
//! │ (session)    │    │ name → id    │    │ (invocation) │
//! └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`ToolDescriptor`]: name, description and input schema of one tool
//! - [`ToolCatalog`]: last-write-wins name → provider binding
//! - [`PlanStep`]: a tool name plus its argument mapping
//! - [`ToolProvider`]: the provider session contract (list / invoke)

pub mod catalog;
pub mod entities;
pub mod output;
pub mod provider;

pub use catalog::{CatalogError, ToolBinding, ToolCatalog};
pub use entities::{PlanStep, ToolDescriptor};
pub use output::carries_error_marker;
pub use provider::{ProviderError, ToolProvider};
