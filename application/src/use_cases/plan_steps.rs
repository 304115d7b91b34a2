//! LLM-backed step planner.

use std::sync::Arc;

use async_trait::async_trait;
use stepwise_domain::util::truncate_str;
use stepwise_domain::{ChainPromptTemplate, Message, PlanStep, ToolDescriptor, parse_plan};
use tracing::{debug, warn};

use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::ports::step_planner::StepPlanner;

/// Plans with one completion request listing every available tool.
///
/// The reply is parsed with [`parse_plan`]; an unparsable or non-array
/// reply becomes an empty plan so the query degrades to answering without
/// tool context.
pub struct LlmPlanner {
    gateway: Arc<dyn LlmGateway>,
    model: String,
}

impl LlmPlanner {
    pub fn new(gateway: Arc<dyn LlmGateway>, model: impl Into<String>) -> Self {
        Self {
            gateway,
            model: model.into(),
        }
    }
}

#[async_trait]
impl StepPlanner for LlmPlanner {
    async fn plan(
        &self,
        query: &str,
        tools: &[ToolDescriptor],
    ) -> Result<Vec<PlanStep>, GatewayError> {
        let messages = vec![
            Message::system(ChainPromptTemplate::planner_system(tools)),
            Message::user(query),
        ];
        let response = self.gateway.complete(&messages, &self.model).await?;
        debug!("Planner response: {}", truncate_str(&response, 500));

        match parse_plan(&response) {
            Ok(parsed) => {
                for skipped in &parsed.skipped {
                    warn!("Dropping malformed plan element: {}", truncate_str(skipped, 200));
                }
                Ok(parsed.steps)
            }
            Err(e) => {
                warn!(
                    "Tool chain planning failed: {}; raw response: {}",
                    e,
                    truncate_str(&response, 500)
                );
                Ok(Vec::new())
            }
        }
    }
}
