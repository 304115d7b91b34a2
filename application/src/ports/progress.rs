//! Progress notification port
//!
//! Defines the callbacks the execution loop fires so the presentation layer
//! can print step traces. Every method has a no-op default.

use stepwise_domain::{AbandonedStep, PlanStep, QueuedStep, StepFailure, Verdict};

/// Callback for progress updates during chain execution
pub trait ChainProgressNotifier: Send + Sync {
    /// Planner call is about to be issued
    fn on_planning_start(&self) {}

    /// Planner returned (possibly empty) steps
    fn on_plan_ready(&self, _steps: &[PlanStep]) {}

    /// A resolved step is about to be dispatched.
    ///
    /// `call_number` counts dispatches within the query, starting at 1.
    fn on_step_start(&self, _call_number: usize, _step: &PlanStep, _provider_id: Option<&str>) {}

    /// Raw provider output for the step just dispatched
    fn on_step_output(&self, _step: &PlanStep, _output: &str) {}

    /// Relevance judge call is about to be issued
    fn on_judging(&self, _step: &PlanStep) {}

    /// Relevance judge answered
    fn on_verdict(&self, _step: &PlanStep, _verdict: Verdict) {}

    /// Step output entered the history and transcript
    fn on_step_accepted(&self, _ordinal: usize, _step: &PlanStep) {}

    /// Step went back to the tail of the queue
    fn on_step_requeued(&self, _step: &QueuedStep, _reason: &StepFailure) {}

    /// Step was dropped by the termination guard
    fn on_step_abandoned(&self, _step: &AbandonedStep) {}

    /// Synthesis call is about to be issued
    fn on_synthesis_start(&self, _accepted: usize) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoChainProgress;

impl ChainProgressNotifier for NoChainProgress {}
