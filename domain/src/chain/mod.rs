//! Chain execution state
//!
//! Per-query values owned by the execution loop:
//!
//! - [`PendingQueue`]: FIFO of [`QueuedStep`]s, failures go to the tail
//! - [`OutputHistory`]: tool name → last accepted output
//! - [`Transcript`]: accepted calls, rendered for the synthesis call
//!
//! plus reference resolution ([`resolve_arguments`]), relevance
//! [`Verdict`]s, and the [`QueryOutcome`] returned to callers.

pub mod history;
pub mod outcome;
pub mod queue;
pub mod reference;
pub mod transcript;
pub mod verdict;

pub use history::OutputHistory;
pub use outcome::{AbandonedStep, AcceptedStep, QueryOutcome, StepFailure};
pub use queue::{PendingQueue, QueuedStep};
pub use reference::{
    Resolution, StepResolution, extract_references, resolve_arguments, resolve_value,
};
pub use transcript::{Transcript, TranscriptTurn};
pub use verdict::Verdict;
