//! Domain layer for stepwise
//!
//! This crate contains the core business logic, entities, and value objects
//! of the tool-chain engine. It has no dependencies on infrastructure or
//! presentation concerns.
//!
//! # Core Concepts
//!
//! ## Plans and references
//!
//! A query is decomposed up front into an ordered list of [`PlanStep`]s.
//! Because the plan is produced before any tool runs, data dependencies are
//! expressed as textual `{{tool_name}}` placeholders, resolved at execution
//! time against the [`OutputHistory`].
//!
//! ## Requeue on failure
//!
//! Steps that cannot be resolved yet, report an error, or are judged
//! irrelevant go back to the tail of the [`PendingQueue`] instead of failing
//! the query.

pub mod chain;
pub mod normalization;
pub mod plan;
pub mod prompt;
pub mod session;
pub mod tool;
pub mod util;

// Re-export commonly used types
pub use chain::{
    AbandonedStep, AcceptedStep, OutputHistory, PendingQueue, QueryOutcome, QueuedStep,
    Resolution, StepFailure, StepResolution, Transcript, TranscriptTurn, Verdict,
    extract_references, resolve_arguments, resolve_value,
};
pub use normalization::{NormalizationPolicy, PathRule};
pub use plan::{ParsedPlan, PlanParseError, parse_plan};
pub use prompt::{ARITHMETIC_OUTPUT_PREFIX, ChainPromptTemplate};
pub use session::{Message, Role, ToolCallRecord};
pub use tool::{
    CatalogError, PlanStep, ProviderError, ToolBinding, ToolCatalog, ToolDescriptor, ToolProvider,
    carries_error_marker,
};
