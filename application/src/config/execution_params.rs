//! Execution parameters: chain loop control.
//!
//! [`ExecutionParams`] groups the static parameters that control the
//! execution loop in [`RunQueryUseCase`](crate::use_cases::run_query::RunQueryUseCase).

use serde::{Deserialize, Serialize};
use stepwise_domain::StepFailure;

/// Execution loop control parameters.
///
/// The termination guard has two parts:
///
/// | Parameter               | Effect                                              |
/// |-------------------------|-----------------------------------------------------|
/// | `max_attempts_per_step` | a step failing this many times is abandoned         |
/// | `stop_when_stalled`     | stop once every queued step is waiting on a missing reference |
///
/// `max_attempts_per_step = None` with `stop_when_stalled = false` retries
/// forever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Failed attempts after which a step is abandoned.
    pub max_attempts_per_step: Option<u32>,
    /// Abandon the remaining queue when no step can resolve.
    pub stop_when_stalled: bool,
    /// Tools whose output skips the relevance judge.
    pub arithmetic_tools: Vec<String>,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            max_attempts_per_step: Some(3),
            stop_when_stalled: true,
            arithmetic_tools: vec!["calculate".to_string()],
        }
    }
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    pub fn with_max_attempts_per_step(mut self, max: Option<u32>) -> Self {
        self.max_attempts_per_step = max;
        self
    }

    pub fn with_stop_when_stalled(mut self, stop: bool) -> Self {
        self.stop_when_stalled = stop;
        self
    }

    pub fn with_arithmetic_tools(mut self, tools: Vec<String>) -> Self {
        self.arithmetic_tools = tools;
        self
    }

    pub fn is_arithmetic(&self, tool: &str) -> bool {
        self.arithmetic_tools.iter().any(|t| t == tool)
    }

    /// Whether `failure` is charged to the step's attempt count.
    ///
    /// Unresolved passes only count when stall detection is off; otherwise
    /// the stall check is what ends a step that can never resolve.
    pub fn counts_against_attempts(&self, failure: &StepFailure) -> bool {
        !(self.stop_when_stalled && matches!(failure, StepFailure::Unresolved(_)))
    }

    /// Whether a step with `attempts` failures has used up its retries
    pub fn attempts_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts_per_step.is_some_and(|max| attempts >= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = ExecutionParams::default();
        assert_eq!(params.max_attempts_per_step, Some(3));
        assert!(params.stop_when_stalled);
        assert!(params.is_arithmetic("calculate"));
        assert!(!params.is_arithmetic("get_time"));
    }

    #[test]
    fn test_builder() {
        let params = ExecutionParams::default()
            .with_max_attempts_per_step(None)
            .with_stop_when_stalled(false)
            .with_arithmetic_tools(vec!["eval".to_string()]);

        assert!(!params.attempts_exhausted(1_000));
        assert!(!params.stop_when_stalled);
        assert!(params.is_arithmetic("eval"));
    }

    #[test]
    fn test_unresolved_charged_only_without_stall_detection() {
        let unresolved = StepFailure::Unresolved(vec!["get_time".to_string()]);
        let errored = StepFailure::ErrorMarked("Error: busy".to_string());

        let params = ExecutionParams::default();
        assert!(!params.counts_against_attempts(&unresolved));
        assert!(params.counts_against_attempts(&errored));

        let params = params.with_stop_when_stalled(false);
        assert!(params.counts_against_attempts(&unresolved));
        assert!(params.counts_against_attempts(&errored));
    }

    #[test]
    fn test_attempts_exhausted() {
        let params = ExecutionParams::default();
        assert!(!params.attempts_exhausted(2));
        assert!(params.attempts_exhausted(3));
    }
}
