//! Tool domain entities

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A capability advertised by a tool provider.
///
/// Created when a provider session is connected and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique name of the tool (e.g., "create_file")
    pub name: String,
    /// Human-readable description, shown to the planner
    #[serde(default)]
    pub description: String,
    /// JSON Schema of the tool's arguments, as advertised by the provider
    #[serde(rename = "inputSchema", alias = "input_schema", default = "empty_schema")]
    pub input_schema: Value,
}

fn empty_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: empty_schema(),
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Builder helper that adds a string property to an object schema.
    pub fn with_string_arg(
        mut self,
        name: &str,
        description: &str,
        required: bool,
    ) -> Self {
        if let Some(obj) = self.input_schema.as_object_mut() {
            let props = obj
                .entry("properties")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Some(props) = props.as_object_mut() {
                props.insert(
                    name.to_string(),
                    serde_json::json!({ "type": "string", "description": description }),
                );
            }
            if required {
                let req = obj
                    .entry("required")
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Some(req) = req.as_array_mut() {
                    req.push(Value::String(name.to_string()));
                }
            }
        }
        self
    }

    /// Names of the properties declared by the input schema.
    pub fn argument_names(&self) -> Vec<&str> {
        self.input_schema
            .get("properties")
            .and_then(|p| p.as_object())
            .map(|p| p.keys().map(|k| k.as_str()).collect())
            .unwrap_or_default()
    }
}

/// One proposed tool invocation, as produced by the planner.
///
/// Argument values may contain `{{tool_name}}` back-references that are
/// rewritten at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    /// Name of the tool to call
    pub name: String,
    /// Argument mapping passed to the tool
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl PlanStep {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Map::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Get a string argument
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Arguments rendered as a compact JSON object, for traces and transcripts.
    pub fn arguments_json(&self) -> String {
        Value::Object(self.arguments.clone()).to_string()
    }
}
