//! Step planner port

use async_trait::async_trait;
use stepwise_domain::{PlanStep, ToolDescriptor};

use super::llm_gateway::GatewayError;

/// Decomposes a query into an ordered list of tool calls.
///
/// An unusable plan is an empty `Vec`, not an error; `Err` is reserved for
/// failures to reach the model.
#[async_trait]
pub trait StepPlanner: Send + Sync {
    async fn plan(
        &self,
        query: &str,
        tools: &[ToolDescriptor],
    ) -> Result<Vec<PlanStep>, GatewayError>;
}
