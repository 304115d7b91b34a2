//! Prompt domain
//!
//! Templates for the planner, relevance judge and transcript annotations.

pub mod chain;

pub use chain::{ARITHMETIC_OUTPUT_PREFIX, ChainPromptTemplate};
