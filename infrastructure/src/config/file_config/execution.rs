//! Execution loop configuration from TOML (`[execution]` section)

use serde::{Deserialize, Serialize};
use stepwise_application::ExecutionParams;

/// Termination guard and judge exemptions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExecutionConfig {
    /// Failed attempts after which a step is abandoned
    pub max_attempts_per_step: u32,
    /// Ignore `max_attempts_per_step` and retry until the queue drains
    pub unbounded_retry: bool,
    /// Abandon the queue once every step waits on a missing reference
    pub stop_when_stalled: bool,
    /// Tools whose output skips the relevance judge
    pub arithmetic_tools: Vec<String>,
}

impl Default for FileExecutionConfig {
    fn default() -> Self {
        let params = ExecutionParams::default();
        Self {
            max_attempts_per_step: params.max_attempts_per_step.unwrap_or(3),
            unbounded_retry: false,
            stop_when_stalled: params.stop_when_stalled,
            arithmetic_tools: params.arithmetic_tools,
        }
    }
}

impl FileExecutionConfig {
    pub fn to_execution_params(&self) -> ExecutionParams {
        let max = if self.unbounded_retry {
            None
        } else {
            Some(self.max_attempts_per_step)
        };
        ExecutionParams::default()
            .with_max_attempts_per_step(max)
            .with_stop_when_stalled(self.stop_when_stalled)
            .with_arithmetic_tools(self.arithmetic_tools.clone())
    }
}
