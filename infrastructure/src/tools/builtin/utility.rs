//! Utility provider: get_time, calculate.

use async_trait::async_trait;
use chrono::Local;
use serde_json::{Map, Value, json};
use stepwise_domain::{ProviderError, ToolDescriptor, ToolProvider};

use super::calculator;

pub const PROVIDER_ID: &str = "utility";

pub const GET_TIME: &str = "get_time";
pub const CALCULATE: &str = "calculate";

const TIME_FORMAT: &str = "%Y年%m月%d日 %H:%M:%S";

/// Clock and arithmetic tools
#[derive(Debug, Clone, Default)]
pub struct UtilityProvider;

impl UtilityProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn descriptors() -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new(GET_TIME, "Get the current local date and time"),
            ToolDescriptor::new(
                CALCULATE,
                "Evaluate an arithmetic expression (+ - * / // % ** and math functions such as sqrt, sin, log)",
            )
            .with_string_arg("expression", "The expression to evaluate, e.g. 2 * (3 + 4)", true),
        ]
    }

    fn calculate(arguments: &Map<String, Value>) -> String {
        let expression = match arguments.get("expression") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return json!({ "error": "Expression evaluation failed: missing argument 'expression'" })
                    .to_string();
            }
        };
        match calculator::evaluate(&expression) {
            Ok(value) => value.to_string(),
            Err(e) => json!({ "error": format!("Expression evaluation failed: {}", e) }).to_string(),
        }
    }
}

#[async_trait]
impl ToolProvider for UtilityProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ProviderError> {
        Ok(Self::descriptors())
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<String, ProviderError> {
        Ok(match name {
            GET_TIME => Local::now().format(TIME_FORMAT).to_string(),
            CALCULATE => Self::calculate(arguments),
            other => json!({ "error": format!("Unknown tool: {}", other) }).to_string(),
        })
    }
}
