//! Builtin tool providers
//!
//! Two in-process provider sessions, each registered under its own id:
//!
//! - [`FilesystemProvider`] (`"filesystem"`): local file operations
//! - [`UtilityProvider`] (`"utility"`): clock and calculator

pub mod calculator;
mod filesystem;
mod utility;

pub use filesystem::FilesystemProvider;
pub use utility::UtilityProvider;
