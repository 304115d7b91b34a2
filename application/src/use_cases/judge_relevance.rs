//! LLM-backed relevance judge.

use std::sync::Arc;

use async_trait::async_trait;
use stepwise_domain::{ChainPromptTemplate, Message, Verdict};
use tracing::debug;

use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::ports::relevance_classifier::RelevanceClassifier;

/// Binary classifier backed by one completion call.
///
/// Only an exact `True` label is admissible; see [`Verdict::from_label`].
pub struct LlmRelevanceJudge {
    gateway: Arc<dyn LlmGateway>,
    model: String,
}

impl LlmRelevanceJudge {
    pub fn new(gateway: Arc<dyn LlmGateway>, model: impl Into<String>) -> Self {
        Self {
            gateway,
            model: model.into(),
        }
    }
}

#[async_trait]
impl RelevanceClassifier for LlmRelevanceJudge {
    async fn classify(&self, query: &str, output: &str) -> Result<Verdict, GatewayError> {
        let messages = vec![
            Message::system(ChainPromptTemplate::judge_system()),
            Message::user(ChainPromptTemplate::judge_user(query, output)),
        ];
        let label = self.gateway.complete(&messages, &self.model).await?;
        let verdict = Verdict::from_label(&label);
        debug!("Judge label {:?} -> {}", label.trim(), verdict);
        Ok(verdict)
    }
}
