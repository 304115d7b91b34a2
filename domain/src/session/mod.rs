//! Conversation messages.
//!
//! - [`entities::Message`]: a single chat message, optionally carrying a
//!   tool call or answering one
//! - [`entities::Role`]: system / user / assistant / tool

pub mod entities;

pub use entities::{Message, Role, ToolCallRecord};
