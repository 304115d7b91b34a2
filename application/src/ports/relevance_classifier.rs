//! Relevance classifier port

use async_trait::async_trait;
use stepwise_domain::Verdict;

use super::llm_gateway::GatewayError;

/// Decides whether a step's output is usable context for the query.
#[async_trait]
pub trait RelevanceClassifier: Send + Sync {
    async fn classify(&self, query: &str, output: &str) -> Result<Verdict, GatewayError>;
}
