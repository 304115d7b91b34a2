//! Per-step failure reasons and the per-query outcome.

use std::fmt;

use crate::tool::entities::PlanStep;
use crate::util::truncate_str;

/// Why a step attempt was not accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepFailure {
    /// Back-references with no captured output yet
    Unresolved(Vec<String>),
    /// Provider output carried an error marker
    ErrorMarked(String),
    /// The relevance judge rejected the output
    NotAdmissible(String),
}

impl StepFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            StepFailure::Unresolved(_) => "unresolved",
            StepFailure::ErrorMarked(_) => "error_marked",
            StepFailure::NotAdmissible(_) => "not_admissible",
        }
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepFailure::Unresolved(refs) => {
                let refs: Vec<String> = refs.iter().map(|r| format!("{{{{{}}}}}", r)).collect();
                write!(f, "unresolved references: {}", refs.join(", "))
            }
            StepFailure::ErrorMarked(output) => {
                write!(f, "tool reported an error: {}", truncate_str(output, 200))
            }
            StepFailure::NotAdmissible(_) => write!(f, "output judged not relevant"),
        }
    }
}

/// A step that reached the `Accepted` state
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedStep {
    pub ordinal: usize,
    /// Step with resolved, normalized arguments
    pub step: PlanStep,
    /// Raw provider output
    pub output: String,
}

/// A step the termination guard gave up on
#[derive(Debug, Clone, PartialEq)]
pub struct AbandonedStep {
    pub ordinal: usize,
    /// Step with its original, unresolved arguments
    pub step: PlanStep,
    pub attempts: u32,
    pub reason: StepFailure,
}

/// What a query produced
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub answer: String,
    pub accepted: Vec<AcceptedStep>,
    pub abandoned: Vec<AbandonedStep>,
}

impl QueryOutcome {
    pub fn is_complete(&self) -> bool {
        self.abandoned.is_empty()
    }
}
