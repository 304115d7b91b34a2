//! Tool provider sessions and the registry that routes to them
//!
//! ## Providers
//!
//! - `builtin`: in-process filesystem and utility providers
//! - `crate::mcp`: external MCP servers over stdio
//!
//! All of them are aggregated by [`ToolRegistry`].

pub mod builtin;

mod registry;

pub use builtin::{FilesystemProvider, UtilityProvider};
pub use registry::{RegistryStats, ToolRegistry};
