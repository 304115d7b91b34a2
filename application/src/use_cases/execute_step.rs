//! Execute Step use case.
//!
//! Takes a step whose back-references are already resolved, applies the
//! [`NormalizationPolicy`] for the provider it is bound to, and dispatches
//! it through the [`ToolExecutorPort`].

use std::sync::Arc;

use serde_json::{Map, Value};
use stepwise_domain::{CatalogError, NormalizationPolicy, PlanStep, ProviderError};
use tracing::debug;

use crate::ports::tool_executor::ToolExecutorPort;

/// A normalized call ready for dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedCall {
    /// Step with resolved, normalized arguments
    pub step: PlanStep,
    /// Bound provider, or why there is none
    pub binding: Result<String, CatalogError>,
}

impl PreparedCall {
    pub fn provider_id(&self) -> Option<&str> {
        self.binding.as_deref().ok()
    }
}

/// Normalizes and dispatches resolved steps.
pub struct ExecuteStepUseCase {
    tool_executor: Arc<dyn ToolExecutorPort>,
    policy: NormalizationPolicy,
}

impl ExecuteStepUseCase {
    pub fn new(tool_executor: Arc<dyn ToolExecutorPort>, policy: NormalizationPolicy) -> Self {
        Self {
            tool_executor,
            policy,
        }
    }

    pub fn tool_executor(&self) -> &Arc<dyn ToolExecutorPort> {
        &self.tool_executor
    }

    /// Bind `name` to its provider and normalize `arguments` for it.
    pub fn prepare(&self, name: &str, mut arguments: Map<String, Value>) -> PreparedCall {
        let binding = self
            .tool_executor
            .catalog()
            .resolve(name)
            .map(str::to_string);

        if let Ok(provider_id) = &binding {
            let touched = self.policy.apply(name, provider_id, &mut arguments);
            if !touched.is_empty() {
                debug!(tool = %name, "Normalized arguments: {}", touched.join(", "));
            }
        }

        PreparedCall {
            step: PlanStep {
                name: name.to_string(),
                arguments,
            },
            binding,
        }
    }

    /// Dispatch a prepared call.
    ///
    /// An unbound tool yields error-marked text so the caller requeues it
    /// like any other tool failure.
    pub async fn dispatch(&self, call: &PreparedCall) -> Result<String, ProviderError> {
        match &call.binding {
            Ok(provider_id) => {
                self.tool_executor
                    .invoke(provider_id, &call.step.name, &call.step.arguments)
                    .await
            }
            Err(e) => Ok(format!("Error: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use stepwise_domain::{ToolCatalog, ToolDescriptor, carries_error_marker};

    struct RecordingExecutor {
        catalog: ToolCatalog,
        calls: Mutex<Vec<(String, String, Map<String, Value>)>>,
    }

    impl RecordingExecutor {
        fn new() -> Self {
            let mut catalog = ToolCatalog::new();
            catalog.register("filesystem", vec![ToolDescriptor::new("create_file", "")]);
            catalog.register("utility", vec![ToolDescriptor::new("get_time", "")]);
            Self {
                catalog,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ToolExecutorPort for RecordingExecutor {
        fn catalog(&self) -> &ToolCatalog {
            &self.catalog
        }

        async fn invoke(
            &self,
            provider_id: &str,
            name: &str,
            arguments: &Map<String, Value>,
        ) -> Result<String, ProviderError> {
            self.calls.lock().unwrap().push((
                provider_id.to_string(),
                name.to_string(),
                arguments.clone(),
            ));
            Ok("ok".to_string())
        }
    }

    fn use_case(executor: Arc<RecordingExecutor>) -> ExecuteStepUseCase {
        ExecuteStepUseCase::new(
            executor,
            NormalizationPolicy::standard(Some(PathBuf::from("/data"))),
        )
    }

    #[tokio::test]
    async fn test_filesystem_call_is_normalized_and_dispatched() {
        let executor = Arc::new(RecordingExecutor::new());
        let uc = use_case(executor.clone());

        let mut args = Map::new();
        args.insert("file_name".into(), json!("out.txt"));
        let call = uc.prepare("create_file", args);
        assert_eq!(call.provider_id(), Some("filesystem"));
        assert_eq!(call.step.arguments["file_name"], json!("/data/out.txt"));

        assert_eq!(uc.dispatch(&call).await.unwrap(), "ok");
        let calls = executor.calls.lock().unwrap();
        assert_eq!(calls[0].0, "filesystem");
        assert_eq!(calls[0].1, "create_file");
        assert_eq!(calls[0].2["file_name"], json!("/data/out.txt"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_marked_without_dispatch() {
        let executor = Arc::new(RecordingExecutor::new());
        let uc = use_case(executor.clone());

        let call = uc.prepare("send_email", Map::new());
        assert!(call.provider_id().is_none());
        let copy = call.clone();
        assert_eq!(copy.binding, Err(CatalogError::NotFound("send_email".into())));

        let output = uc.dispatch(&call).await.unwrap();
        assert!(carries_error_marker(&output));
        assert!(output.contains("send_email"));
        assert!(executor.calls.lock().unwrap().is_empty());
    }
}
