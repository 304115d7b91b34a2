//! Run Query use case.
//!
//! Answers one natural-language query by planning a tool chain, draining it
//! through the execution loop, and synthesizing a reply from the accepted
//! outputs.
//!
//! # Step lifecycle
//!
//! ```text
//! Pending ─▶ Resolving ─┬─▶ Unresolved ─▶ Requeued ─▶ Pending
//!                       └─▶ Resolved ─▶ Executing ─┬─▶ Accepted (done)
//!                                                  └─▶ Rejected ─▶ Requeued
//! Requeued ─▶ Abandoned   (termination guard)
//! ```
//!
//! Steps run strictly one at a time in queue order. A step is rejected when
//! its output carries an error marker or the relevance judge says it is not
//! admissible; arithmetic tools skip the judge. Failed steps go back to the
//! tail with their original arguments, so a retry always comes after
//! whatever step could produce a missing reference.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;
use stepwise_domain::util::truncate_str;
use stepwise_domain::{
    ARITHMETIC_OUTPUT_PREFIX, AbandonedStep, AcceptedStep, NormalizationPolicy, OutputHistory,
    PendingQueue, PlanStep, ProviderError, QueryOutcome, QueuedStep, StepFailure, StepResolution,
    Transcript, carries_error_marker, resolve_arguments,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ExecutionParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::ports::progress::ChainProgressNotifier;
use crate::ports::relevance_classifier::RelevanceClassifier;
use crate::ports::step_planner::StepPlanner;
use crate::ports::tool_executor::ToolExecutorPort;
use crate::use_cases::execute_step::ExecuteStepUseCase;

/// Errors that end a query early.
///
/// Everything recoverable (unresolved references, tool errors, negative
/// verdicts) is handled by requeueing and never surfaces here.
#[derive(Error, Debug)]
pub enum RunQueryError {
    #[error("Gateway error: {0}")]
    GatewayError(#[from] GatewayError),

    #[error("Provider error: {0}")]
    ProviderError(#[from] ProviderError),
}

/// Input for the [`RunQueryUseCase`].
#[derive(Debug, Clone)]
pub struct RunQueryInput {
    /// The user's request.
    pub query: String,
    /// Model used for the final synthesis call.
    pub model: String,
    /// Termination guard and judge exemptions.
    pub execution: ExecutionParams,
}

impl RunQueryInput {
    pub fn new(query: impl Into<String>, model: impl Into<String>, execution: ExecutionParams) -> Self {
        Self {
            query: query.into(),
            model: model.into(),
            execution,
        }
    }
}

/// Result of one dispatched attempt
enum Attempt {
    Accepted {
        step: PlanStep,
        output: String,
        transcript_text: String,
    },
    Rejected(StepFailure),
}

/// Use case for answering a query with a tool chain.
pub struct RunQueryUseCase {
    gateway: Arc<dyn LlmGateway>,
    planner: Arc<dyn StepPlanner>,
    judge: Arc<dyn RelevanceClassifier>,
    executor: ExecuteStepUseCase,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl RunQueryUseCase {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        tool_executor: Arc<dyn ToolExecutorPort>,
        planner: Arc<dyn StepPlanner>,
        judge: Arc<dyn RelevanceClassifier>,
    ) -> Self {
        Self {
            gateway,
            planner,
            judge,
            executor: ExecuteStepUseCase::new(tool_executor, NormalizationPolicy::default()),
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    /// Replace the argument normalization policy.
    pub fn with_normalization(mut self, policy: NormalizationPolicy) -> Self {
        let tool_executor = self.executor.tool_executor().clone();
        self.executor = ExecuteStepUseCase::new(tool_executor, policy);
        self
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Plan, execute and synthesize one query.
    pub async fn execute(
        &self,
        input: RunQueryInput,
        progress: &dyn ChainProgressNotifier,
    ) -> Result<QueryOutcome, RunQueryError> {
        info!("Starting query: {}", truncate_str(&input.query, 100));

        // ==================== Planning ====================
        progress.on_planning_start();
        let descriptors: Vec<_> = self
            .executor
            .tool_executor()
            .catalog()
            .descriptors()
            .cloned()
            .collect();
        let plan = self.planner.plan(&input.query, &descriptors).await?;
        info!("Plan has {} step(s)", plan.len());
        self.conversation_logger.log(ConversationEvent::new(
            "plan_generated",
            json!({ "query": input.query, "steps": plan }),
        ));
        progress.on_plan_ready(&plan);

        // ==================== Execution loop ====================
        let exec = &input.execution;
        let mut queue = PendingQueue::from_plan(plan);
        let mut history = OutputHistory::new();
        let mut transcript = Transcript::new(&input.query);
        let mut accepted: Vec<AcceptedStep> = Vec::new();
        let mut abandoned: Vec<AbandonedStep> = Vec::new();
        // Ordinals that came back unresolved since the last acceptance
        let mut stalled: HashSet<usize> = HashSet::new();
        let mut call_number = 0;

        while let Some(mut queued) = queue.next() {
            let failure = match resolve_arguments(&queued.step.arguments, &history) {
                StepResolution::Unresolved(missing) => {
                    debug!(tool = %queued.step.name, "Unresolved references: {:?}", missing);
                    stalled.insert(queued.ordinal);
                    StepFailure::Unresolved(missing)
                }
                StepResolution::Resolved(arguments) => {
                    call_number += 1;
                    match self
                        .attempt(&input, call_number, &queued, arguments, progress)
                        .await?
                    {
                        Attempt::Accepted {
                            step,
                            output,
                            transcript_text,
                        } => {
                            if let Some(previous) = history.record(&step.name, output.clone()) {
                                debug!(
                                    tool = %step.name,
                                    "Replacing earlier output ({} bytes)",
                                    previous.len()
                                );
                            }
                            transcript.push(step.clone(), transcript_text);
                            progress.on_step_accepted(queued.ordinal, &step);
                            accepted.push(AcceptedStep {
                                ordinal: queued.ordinal,
                                step,
                                output,
                            });
                            stalled.clear();
                            continue;
                        }
                        Attempt::Rejected(failure) => failure,
                    }
                }
            };

            // With stall detection on, waiting for a producer still in the
            // queue is not a failed attempt
            let attempts = if exec.counts_against_attempts(&failure) {
                queued.record_failure()
            } else {
                queued.attempts
            };
            if exec.attempts_exhausted(attempts) {
                self.abandon(queued, failure, progress, &mut abandoned);
            } else {
                debug!(
                    tool = %queued.step.name,
                    attempt = attempts,
                    "Requeueing step: {}",
                    failure
                );
                self.conversation_logger.log(ConversationEvent::new(
                    "step_requeued",
                    json!({
                        "ordinal": queued.ordinal,
                        "tool": queued.step.name,
                        "attempts": attempts,
                        "reason": failure.kind(),
                        "detail": failure.to_string(),
                    }),
                ));
                progress.on_step_requeued(&queued, &failure);
                queue.requeue(queued);
            }

            if exec.stop_when_stalled
                && !queue.is_empty()
                && queue.iter().all(|q| stalled.contains(&q.ordinal))
            {
                warn!(
                    "No queued step can resolve its references; abandoning {} step(s)",
                    queue.len()
                );
                for q in queue.drain() {
                    let missing = match resolve_arguments(&q.step.arguments, &history) {
                        StepResolution::Unresolved(missing) => missing,
                        StepResolution::Resolved(_) => Vec::new(),
                    };
                    self.abandon(q, StepFailure::Unresolved(missing), progress, &mut abandoned);
                }
            }
        }

        // ==================== Synthesis ====================
        progress.on_synthesis_start(transcript.len());
        let answer = self
            .gateway
            .complete(&transcript.to_messages(), &input.model)
            .await?;
        self.conversation_logger.log(ConversationEvent::new(
            "final_answer",
            json!({
                "query": input.query,
                "answer": answer,
                "accepted": accepted.len(),
                "abandoned": abandoned.len(),
            }),
        ));
        info!(
            "Query finished: {} accepted, {} abandoned",
            accepted.len(),
            abandoned.len()
        );

        Ok(QueryOutcome {
            answer,
            accepted,
            abandoned,
        })
    }

    /// Normalize, dispatch and gate one resolved step.
    async fn attempt(
        &self,
        input: &RunQueryInput,
        call_number: usize,
        queued: &QueuedStep,
        arguments: serde_json::Map<String, serde_json::Value>,
        progress: &dyn ChainProgressNotifier,
    ) -> Result<Attempt, RunQueryError> {
        let call = self.executor.prepare(&queued.step.name, arguments);
        progress.on_step_start(call_number, &call.step, call.provider_id());
        info!(
            tool = %call.step.name,
            provider = call.provider_id().unwrap_or("-"),
            "Call #{}: {}",
            call_number,
            call.step.arguments_json()
        );
        self.conversation_logger.log(ConversationEvent::new(
            "tool_call",
            json!({
                "call_number": call_number,
                "ordinal": queued.ordinal,
                "tool": call.step.name,
                "provider": call.provider_id(),
                "arguments": call.step.arguments,
            }),
        ));

        let output = self.executor.dispatch(&call).await?;
        let error_marked = carries_error_marker(&output);
        self.conversation_logger.log(ConversationEvent::new(
            "tool_result",
            json!({
                "call_number": call_number,
                "tool": call.step.name,
                "output": output,
                "error_marked": error_marked,
            }),
        ));
        progress.on_step_output(&call.step, &output);

        if error_marked {
            return Ok(Attempt::Rejected(StepFailure::ErrorMarked(output)));
        }

        if input.execution.is_arithmetic(&call.step.name) {
            let transcript_text = format!("{}{}", ARITHMETIC_OUTPUT_PREFIX, output);
            return Ok(Attempt::Accepted {
                step: call.step,
                output,
                transcript_text,
            });
        }

        progress.on_judging(&call.step);
        let verdict = self.judge.classify(&input.query, &output).await?;
        self.conversation_logger.log(ConversationEvent::new(
            "relevance_verdict",
            json!({
                "call_number": call_number,
                "tool": call.step.name,
                "verdict": verdict,
            }),
        ));
        progress.on_verdict(&call.step, verdict);

        if verdict.is_admissible() {
            Ok(Attempt::Accepted {
                step: call.step,
                transcript_text: output.clone(),
                output,
            })
        } else {
            Ok(Attempt::Rejected(StepFailure::NotAdmissible(output)))
        }
    }

    fn abandon(
        &self,
        queued: QueuedStep,
        reason: StepFailure,
        progress: &dyn ChainProgressNotifier,
        abandoned: &mut Vec<AbandonedStep>,
    ) {
        warn!(
            tool = %queued.step.name,
            attempts = queued.attempts,
            "Abandoning step: {}",
            reason
        );
        self.conversation_logger.log(ConversationEvent::new(
            "step_abandoned",
            json!({
                "ordinal": queued.ordinal,
                "tool": queued.step.name,
                "attempts": queued.attempts,
                "reason": reason.kind(),
                "detail": reason.to_string(),
            }),
        ));
        let step = AbandonedStep {
            ordinal: queued.ordinal,
            step: queued.step,
            attempts: queued.attempts,
            reason,
        };
        progress.on_step_abandoned(&step);
        abandoned.push(step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::progress::NoChainProgress;
    use async_trait::async_trait;
    use serde_json::{Map, Value};
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use stepwise_domain::{Message, Role, ToolCatalog, ToolDescriptor, Verdict};

    // ==================== Test Mocks ====================

    /// Synthesis gateway: records every history it is sent.
    struct MockGateway {
        replies: Mutex<VecDeque<String>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl MockGateway {
        fn new(replies: Vec<&str>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().map(String::from).collect()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmGateway for MockGateway {
        async fn complete(&self, messages: &[Message], _model: &str) -> Result<String, GatewayError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| GatewayError::Other("No more responses".to_string()))
        }
    }

    struct StubPlanner {
        steps: Vec<PlanStep>,
    }

    #[async_trait]
    impl StepPlanner for StubPlanner {
        async fn plan(
            &self,
            _query: &str,
            _tools: &[ToolDescriptor],
        ) -> Result<Vec<PlanStep>, GatewayError> {
            Ok(self.steps.clone())
        }
    }

    /// Classifier with scripted verdicts; admits by default once exhausted.
    struct StubJudge {
        verdicts: Mutex<VecDeque<Verdict>>,
        calls: Mutex<Vec<String>>,
    }

    impl StubJudge {
        fn admitting() -> Self {
            Self::scripted(vec![])
        }

        fn scripted(verdicts: Vec<Verdict>) -> Self {
            Self {
                verdicts: Mutex::new(verdicts.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RelevanceClassifier for StubJudge {
        async fn classify(&self, _query: &str, output: &str) -> Result<Verdict, GatewayError> {
            self.calls.lock().unwrap().push(output.to_string());
            Ok(self
                .verdicts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Verdict::Admissible))
        }
    }

    /// Executor with scripted outputs per tool; falls back to "<tool> ok".
    struct MockExecutor {
        catalog: ToolCatalog,
        outputs: Mutex<HashMap<String, VecDeque<String>>>,
        calls: Mutex<Vec<(String, Map<String, Value>)>>,
    }

    impl MockExecutor {
        fn new() -> Self {
            let mut catalog = ToolCatalog::new();
            catalog.register(
                "utility",
                vec![
                    ToolDescriptor::new("get_time", "Current time"),
                    ToolDescriptor::new("calculate", "Evaluate arithmetic"),
                ],
            );
            catalog.register(
                "filesystem",
                vec![
                    ToolDescriptor::new("create_file", "Create a file"),
                    ToolDescriptor::new("read_file", "Read a file"),
                ],
            );
            Self {
                catalog,
                outputs: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn script(self, tool: &str, outputs: Vec<&str>) -> Self {
            self.outputs.lock().unwrap().insert(
                tool.to_string(),
                outputs.into_iter().map(String::from).collect(),
            );
            self
        }

        fn calls(&self) -> Vec<(String, Map<String, Value>)> {
            self.calls.lock().unwrap().clone()
        }

        fn call_names(&self) -> Vec<String> {
            self.calls().into_iter().map(|(n, _)| n).collect()
        }
    }

    #[async_trait]
    impl ToolExecutorPort for MockExecutor {
        fn catalog(&self) -> &ToolCatalog {
            &self.catalog
        }

        async fn invoke(
            &self,
            _provider_id: &str,
            name: &str,
            arguments: &Map<String, Value>,
        ) -> Result<String, ProviderError> {
            self.calls
                .lock()
                .unwrap()
                .push((name.to_string(), arguments.clone()));
            let scripted = self
                .outputs
                .lock()
                .unwrap()
                .get_mut(name)
                .and_then(|q| q.pop_front());
            Ok(scripted.unwrap_or_else(|| format!("{} ok", name)))
        }
    }

    struct FailingExecutor {
        catalog: ToolCatalog,
    }

    #[async_trait]
    impl ToolExecutorPort for FailingExecutor {
        fn catalog(&self) -> &ToolCatalog {
            &self.catalog
        }

        async fn invoke(
            &self,
            provider_id: &str,
            _name: &str,
            _arguments: &Map<String, Value>,
        ) -> Result<String, ProviderError> {
            Err(ProviderError::TransportFailed(format!("{} exited", provider_id)))
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        requeued: Mutex<Vec<(String, String)>>,
        abandoned: Mutex<Vec<String>>,
    }

    impl ChainProgressNotifier for RecordingProgress {
        fn on_step_requeued(&self, step: &QueuedStep, reason: &StepFailure) {
            self.requeued
                .lock()
                .unwrap()
                .push((step.step.name.clone(), reason.kind().to_string()));
        }

        fn on_step_abandoned(&self, step: &AbandonedStep) {
            self.abandoned.lock().unwrap().push(step.step.name.clone());
        }
    }

    #[derive(Default)]
    struct RecordingLogger {
        events: Mutex<Vec<&'static str>>,
    }

    impl ConversationLogger for RecordingLogger {
        fn log(&self, event: ConversationEvent) {
            self.events.lock().unwrap().push(event.event_type);
        }
    }

    struct Harness {
        gateway: Arc<MockGateway>,
        executor: Arc<MockExecutor>,
        judge: Arc<StubJudge>,
        use_case: RunQueryUseCase,
    }

    fn harness(steps: Vec<PlanStep>, executor: MockExecutor, judge: StubJudge) -> Harness {
        let gateway = Arc::new(MockGateway::new(vec!["final answer"]));
        let executor = Arc::new(executor);
        let judge = Arc::new(judge);
        let use_case = RunQueryUseCase::new(
            gateway.clone(),
            executor.clone(),
            Arc::new(StubPlanner { steps }),
            judge.clone(),
        );
        Harness {
            gateway,
            executor,
            judge,
            use_case,
        }
    }

    fn input(execution: ExecutionParams) -> RunQueryInput {
        RunQueryInput::new("do the thing", "test-model", execution)
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_reference_resolved_before_dispatch() {
        let steps = vec![
            PlanStep::new("get_time"),
            PlanStep::new("create_file")
                .with_arg("file_name", "out.txt")
                .with_arg("content", "now: {{get_time}}"),
        ];
        let h = harness(
            steps,
            MockExecutor::new().script("get_time", vec!["2025年05月29日 10:00:26"]),
            StubJudge::admitting(),
        );

        let outcome = h
            .use_case
            .execute(input(ExecutionParams::default()), &NoChainProgress)
            .await
            .unwrap();

        assert_eq!(outcome.answer, "final answer");
        assert_eq!(outcome.accepted.len(), 2);
        assert!(outcome.abandoned.is_empty());

        let calls = h.executor.calls();
        assert_eq!(calls[0].0, "get_time");
        assert_eq!(calls[1].0, "create_file");
        assert_eq!(
            calls[1].1["content"],
            Value::String("now: 2025年05月29日 10:00:26".to_string())
        );
    }

    #[tokio::test]
    async fn test_forward_reference_waits_for_producer() {
        // create_file comes first but needs get_time's output
        let steps = vec![
            PlanStep::new("create_file").with_arg("content", "{{get_time}}"),
            PlanStep::new("get_time"),
        ];
        let h = harness(
            steps,
            MockExecutor::new().script("get_time", vec!["10:00"]),
            StubJudge::admitting(),
        );
        let progress = RecordingProgress::default();

        let outcome = h
            .use_case
            .execute(input(ExecutionParams::default()), &progress)
            .await
            .unwrap();

        assert_eq!(h.executor.call_names(), vec!["get_time", "create_file"]);
        assert_eq!(h.executor.calls()[1].1["content"], Value::String("10:00".into()));
        assert_eq!(
            *progress.requeued.lock().unwrap(),
            vec![("create_file".to_string(), "unresolved".to_string())]
        );
        let ordinals: Vec<_> = outcome.accepted.iter().map(|a| a.ordinal).collect();
        assert_eq!(ordinals, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_long_dependency_chain_completes_with_defaults() {
        // Each step needs the one after it, so every step but the last
        // waits through several passes
        let steps = vec![
            PlanStep::new("get_time").with_arg("x", "{{create_file}}"),
            PlanStep::new("create_file").with_arg("content", "{{calculate}}"),
            PlanStep::new("calculate").with_arg("expression", "{{read_file}}"),
            PlanStep::new("read_file").with_arg("file_name", "a.txt"),
        ];
        let h = harness(steps, MockExecutor::new(), StubJudge::admitting());

        let outcome = h
            .use_case
            .execute(input(ExecutionParams::default()), &NoChainProgress)
            .await
            .unwrap();

        assert!(outcome.abandoned.is_empty());
        assert_eq!(
            h.executor.call_names(),
            vec!["read_file", "calculate", "create_file", "get_time"]
        );
        assert_eq!(
            h.executor.calls()[3].1["x"],
            Value::String("create_file ok".into())
        );
    }

    #[tokio::test]
    async fn test_dependent_waits_out_producer_retries() {
        let steps = vec![
            PlanStep::new("create_file").with_arg("content", "{{read_file}}"),
            PlanStep::new("read_file").with_arg("file_name", "a.txt"),
        ];
        let h = harness(
            steps,
            MockExecutor::new().script("read_file", vec!["Error: busy", "Error: busy", "contents"]),
            StubJudge::admitting(),
        );

        let outcome = h
            .use_case
            .execute(input(ExecutionParams::default()), &NoChainProgress)
            .await
            .unwrap();

        assert!(outcome.abandoned.is_empty());
        assert_eq!(
            h.executor.call_names(),
            vec!["read_file", "read_file", "read_file", "create_file"]
        );
        assert_eq!(
            h.executor.calls()[3].1["content"],
            Value::String("contents".into())
        );
        let create = outcome
            .accepted
            .iter()
            .find(|a| a.step.name == "create_file")
            .unwrap();
        assert_eq!(create.ordinal, 1);
    }

    #[tokio::test]
    async fn test_rejected_output_never_resolves_reference() {
        let steps = vec![
            PlanStep::new("read_file").with_arg("file_name", "a.txt"),
            PlanStep::new("create_file").with_arg("content", "{{read_file}}"),
        ];
        let h = harness(
            steps,
            MockExecutor::new().script("read_file", vec!["stale noise", "contents"]),
            StubJudge::scripted(vec![Verdict::NotAdmissible]),
        );
        let progress = RecordingProgress::default();

        let outcome = h
            .use_case
            .execute(input(ExecutionParams::default()), &progress)
            .await
            .unwrap();

        // create_file waits while read_file has only a rejected output
        assert_eq!(
            *progress.requeued.lock().unwrap(),
            vec![
                ("read_file".to_string(), "not_admissible".to_string()),
                ("create_file".to_string(), "unresolved".to_string()),
            ]
        );
        assert_eq!(
            h.executor.call_names(),
            vec!["read_file", "read_file", "create_file"]
        );
        assert_eq!(
            h.executor.calls()[2].1["content"],
            Value::String("contents".into())
        );
        assert!(outcome.abandoned.is_empty());
    }

    #[tokio::test]
    async fn test_missing_reference_recurs_then_abandoned() {
        let steps = vec![PlanStep::new("create_file").with_arg("content", "{{missing}}")];
        let h = harness(steps, MockExecutor::new(), StubJudge::admitting());
        let progress = RecordingProgress::default();

        // Stall detection off so the attempt bound is what stops the loop
        let execution = ExecutionParams::default()
            .with_max_attempts_per_step(Some(3))
            .with_stop_when_stalled(false);
        let outcome = h.use_case.execute(input(execution), &progress).await.unwrap();

        assert_eq!(progress.requeued.lock().unwrap().len(), 2);
        assert_eq!(outcome.abandoned.len(), 1);
        let abandoned = &outcome.abandoned[0];
        assert_eq!(abandoned.attempts, 3);
        assert_eq!(
            abandoned.reason,
            StepFailure::Unresolved(vec!["missing".to_string()])
        );
        // Original, unresolved arguments are kept
        assert_eq!(
            abandoned.step.get_string("content"),
            Some("{{missing}}")
        );
        assert!(h.executor.calls().is_empty());
        assert!(outcome.accepted.is_empty());
    }

    #[tokio::test]
    async fn test_stall_detection_stops_immediately() {
        let steps = vec![
            PlanStep::new("get_time"),
            PlanStep::new("create_file").with_arg("content", "{{web_search}}"),
            PlanStep::new("read_file").with_arg("file_name", "{{missing}}"),
        ];
        let h = harness(steps, MockExecutor::new(), StubJudge::admitting());
        let progress = RecordingProgress::default();

        let execution = ExecutionParams::default().with_max_attempts_per_step(None);
        let outcome = h.use_case.execute(input(execution), &progress).await.unwrap();

        assert_eq!(outcome.accepted.len(), 1);
        let abandoned: Vec<_> = outcome
            .abandoned
            .iter()
            .map(|a| (a.step.name.as_str(), a.reason.clone()))
            .collect();
        assert_eq!(
            abandoned,
            vec![
                (
                    "create_file",
                    StepFailure::Unresolved(vec!["web_search".to_string()])
                ),
                (
                    "read_file",
                    StepFailure::Unresolved(vec!["missing".to_string()])
                ),
            ]
        );
        // Synthesis still runs with what was accepted
        assert_eq!(outcome.answer, "final answer");
    }

    #[tokio::test]
    async fn test_repeated_tool_overwrites_history() {
        let steps = vec![
            PlanStep::new("calculate").with_arg("expression", "2+2"),
            PlanStep::new("calculate").with_arg("expression", "3*3"),
            PlanStep::new("create_file").with_arg("content", "{{calculate}}"),
        ];
        let h = harness(
            steps,
            MockExecutor::new().script("calculate", vec!["4", "9"]),
            StubJudge::admitting(),
        );

        h.use_case
            .execute(input(ExecutionParams::default()), &NoChainProgress)
            .await
            .unwrap();

        let calls = h.executor.calls();
        assert_eq!(calls[2].1["content"], Value::String("9".into()));
    }

    #[tokio::test]
    async fn test_arithmetic_skips_judge_and_is_annotated() {
        let steps = vec![PlanStep::new("calculate").with_arg("expression", "6*7")];
        let h = harness(
            steps,
            MockExecutor::new().script("calculate", vec!["42"]),
            // Would reject if consulted
            StubJudge::scripted(vec![Verdict::NotAdmissible]),
        );

        let outcome = h
            .use_case
            .execute(input(ExecutionParams::default()), &NoChainProgress)
            .await
            .unwrap();

        assert_eq!(h.judge.call_count(), 0);
        assert_eq!(outcome.accepted[0].output, "42");

        let seen = h.gateway.seen.lock().unwrap();
        let tool_msg = &seen[0][2];
        assert_eq!(tool_msg.role, Role::Tool);
        assert_eq!(tool_msg.content, format!("{}42", ARITHMETIC_OUTPUT_PREFIX));
    }

    #[tokio::test]
    async fn test_error_marked_output_requeued_once_per_attempt() {
        let steps = vec![
            PlanStep::new("read_file").with_arg("file_name", "a.txt"),
            PlanStep::new("get_time"),
        ];
        let h = harness(
            steps,
            MockExecutor::new().script(
                "read_file",
                vec![r#"{"error": "not found"}"#, "Error: still missing", "contents"],
            ),
            StubJudge::admitting(),
        );
        let progress = RecordingProgress::default();

        let outcome = h
            .use_case
            .execute(input(ExecutionParams::default()), &progress)
            .await
            .unwrap();

        assert_eq!(
            h.executor.call_names(),
            vec!["read_file", "get_time", "read_file", "read_file"]
        );
        let requeued = progress.requeued.lock().unwrap();
        assert_eq!(requeued.len(), 2);
        assert!(requeued.iter().all(|(n, k)| n == "read_file" && k == "error_marked"));

        // Error-marked outputs never reach the judge, history or transcript
        assert_eq!(h.judge.call_count(), 2);
        assert_eq!(outcome.accepted.len(), 2);
        assert_eq!(outcome.accepted[1].output, "contents");
    }

    #[tokio::test]
    async fn test_rejected_output_kept_out_of_transcript() {
        let steps = vec![PlanStep::new("get_time")];
        let h = harness(
            steps,
            MockExecutor::new().script("get_time", vec!["noise", "10:00"]),
            StubJudge::scripted(vec![Verdict::NotAdmissible, Verdict::Admissible]),
        );

        let outcome = h
            .use_case
            .execute(input(ExecutionParams::default()), &NoChainProgress)
            .await
            .unwrap();

        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.accepted[0].output, "10:00");
        let seen = h.gateway.seen.lock().unwrap();
        assert_eq!(seen[0].len(), 3);
        assert!(seen[0].iter().all(|m| m.content != "noise"));
    }

    #[tokio::test]
    async fn test_judge_rejection_exhausts_attempts() {
        let steps = vec![PlanStep::new("get_time")];
        let h = harness(
            steps,
            MockExecutor::new(),
            StubJudge::scripted(vec![Verdict::NotAdmissible; 5]),
        );

        let execution = ExecutionParams::default().with_max_attempts_per_step(Some(2));
        let outcome = h.use_case.execute(input(execution), &NoChainProgress).await.unwrap();

        assert_eq!(h.judge.call_count(), 2);
        assert!(matches!(
            outcome.abandoned[0].reason,
            StepFailure::NotAdmissible(_)
        ));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_requeued_then_abandoned() {
        let steps = vec![PlanStep::new("send_email")];
        let h = harness(steps, MockExecutor::new(), StubJudge::admitting());

        let outcome = h
            .use_case
            .execute(input(ExecutionParams::default()), &NoChainProgress)
            .await
            .unwrap();

        assert!(h.executor.calls().is_empty());
        assert_eq!(outcome.abandoned.len(), 1);
        assert_eq!(outcome.abandoned[0].attempts, 3);
        assert!(matches!(
            outcome.abandoned[0].reason,
            StepFailure::ErrorMarked(_)
        ));
    }

    #[tokio::test]
    async fn test_empty_plan_goes_straight_to_synthesis() {
        let h = harness(vec![], MockExecutor::new(), StubJudge::admitting());

        let outcome = h
            .use_case
            .execute(input(ExecutionParams::default()), &NoChainProgress)
            .await
            .unwrap();

        assert_eq!(outcome.answer, "final answer");
        let seen = h.gateway.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], vec![Message::user("do the thing")]);
    }

    #[tokio::test]
    async fn test_transcript_pairs_calls_with_outputs() {
        let steps = vec![
            PlanStep::new("get_time"),
            PlanStep::new("create_file").with_arg("content", "{{get_time}}"),
        ];
        let h = harness(
            steps,
            MockExecutor::new().script("get_time", vec!["10:00"]),
            StubJudge::admitting(),
        );

        h.use_case
            .execute(input(ExecutionParams::default()), &NoChainProgress)
            .await
            .unwrap();

        let seen = h.gateway.seen.lock().unwrap();
        let roles: Vec<_> = seen[0].iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant, Role::Tool]
        );
        assert_eq!(seen[0][3].tool_calls[0].arguments, r#"{"content":"10:00"}"#);
    }

    #[tokio::test]
    async fn test_provider_transport_failure_is_query_error() {
        let mut catalog = ToolCatalog::new();
        catalog.register("utility", vec![ToolDescriptor::new("get_time", "")]);
        let use_case = RunQueryUseCase::new(
            Arc::new(MockGateway::new(vec!["unused"])),
            Arc::new(FailingExecutor { catalog }),
            Arc::new(StubPlanner {
                steps: vec![PlanStep::new("get_time")],
            }),
            Arc::new(StubJudge::admitting()),
        );

        let result = use_case
            .execute(input(ExecutionParams::default()), &NoChainProgress)
            .await;
        assert!(matches!(result, Err(RunQueryError::ProviderError(_))));
    }

    #[tokio::test]
    async fn test_conversation_events_logged() {
        let steps = vec![PlanStep::new("get_time"), PlanStep::new("calculate")];
        let gateway = Arc::new(MockGateway::new(vec!["done"]));
        let logger = Arc::new(RecordingLogger::default());
        let use_case = RunQueryUseCase::new(
            gateway,
            Arc::new(MockExecutor::new()),
            Arc::new(StubPlanner { steps }),
            Arc::new(StubJudge::admitting()),
        )
        .with_conversation_logger(logger.clone());

        use_case
            .execute(input(ExecutionParams::default()), &NoChainProgress)
            .await
            .unwrap();

        assert_eq!(
            *logger.events.lock().unwrap(),
            vec![
                "plan_generated",
                "tool_call",
                "tool_result",
                "relevance_verdict",
                "tool_call",
                "tool_result",
                "final_answer",
            ]
        );
    }

    #[tokio::test]
    async fn test_normalization_applied_to_bound_provider() {
        let steps = vec![PlanStep::new("create_file").with_arg("content", "x")];
        let gateway = Arc::new(MockGateway::new(vec!["done"]));
        let executor = Arc::new(MockExecutor::new());
        let use_case = RunQueryUseCase::new(
            gateway,
            executor.clone(),
            Arc::new(StubPlanner { steps }),
            Arc::new(StubJudge::admitting()),
        )
        .with_normalization(NormalizationPolicy::standard(Some("/data".into())));

        use_case
            .execute(input(ExecutionParams::default()), &NoChainProgress)
            .await
            .unwrap();

        assert_eq!(
            executor.calls()[0].1["file_name"],
            Value::String("/data/temp.txt".into())
        );
    }
}
