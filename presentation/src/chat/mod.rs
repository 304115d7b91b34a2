//! Interactive mode
//!
//! Provides a readline-based loop that answers one request per line.

mod repl;

pub use repl::ChatRepl;
