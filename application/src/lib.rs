//! Application layer for stepwise
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::ExecutionParams;
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    llm_gateway::{GatewayError, LlmGateway},
    progress::{ChainProgressNotifier, NoChainProgress},
    relevance_classifier::RelevanceClassifier,
    step_planner::StepPlanner,
    tool_executor::ToolExecutorPort,
};
pub use use_cases::execute_step::{ExecuteStepUseCase, PreparedCall};
pub use use_cases::judge_relevance::LlmRelevanceJudge;
pub use use_cases::plan_steps::LlmPlanner;
pub use use_cases::run_query::{RunQueryError, RunQueryInput, RunQueryUseCase};
