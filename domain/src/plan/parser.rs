//! Plan parsing from planner responses.
//!
//! The planner is asked for a JSON array of `{name, arguments}` objects.
//! Models frequently wrap it in a fenced block, so the first
//! ` ``` ` / ` ```json ` block is preferred; otherwise the whole reply is
//! parsed as JSON.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::tool::entities::PlanStep;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:json)?[ \t]*\r?\n([\s\S]+?)\r?\n[ \t]*```").expect("fence pattern is valid")
});

/// Why a reply could not be turned into a plan
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanParseError {
    #[error("plan is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("plan is not a JSON array")]
    NotAnArray,
}

/// Steps parsed from a reply, plus elements that had to be dropped
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedPlan {
    pub steps: Vec<PlanStep>,
    /// Raw JSON of elements that were not objects with a string `name`
    pub skipped: Vec<String>,
}

/// Return the payload of the first fenced block, or the whole text.
pub fn extract_payload(response: &str) -> &str {
    FENCED_BLOCK
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(response)
}

/// Parse a planner reply into ordered steps.
pub fn parse_plan(response: &str) -> Result<ParsedPlan, PlanParseError> {
    let payload = extract_payload(response).trim();
    let value: Value =
        serde_json::from_str(payload).map_err(|e| PlanParseError::InvalidJson(e.to_string()))?;
    let items = match value {
        Value::Array(items) => items,
        _ => return Err(PlanParseError::NotAnArray),
    };

    let mut plan = ParsedPlan::default();
    for item in items {
        match step_from_json(&item) {
            Some(step) => plan.steps.push(step),
            None => plan.skipped.push(item.to_string()),
        }
    }
    Ok(plan)
}

fn step_from_json(item: &Value) -> Option<PlanStep> {
    let obj = item.as_object()?;
    let name = obj.get("name")?.as_str()?;
    let arguments = obj
        .get("arguments")
        .and_then(|a| a.as_object())
        .cloned()
        .unwrap_or_else(Map::new);
    Some(PlanStep {
        name: name.to_string(),
        arguments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_fenced_json_block() {
        let response = r#"Here is the plan:

```json
[
  {"name": "get_time", "arguments": {}},
  {"name": "create_file", "arguments": {"file_name": "out.txt", "content": "now: {{get_time}}"}}
]
```
"#;
        let plan = parse_plan(response).unwrap();
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].name, "get_time");
        assert_eq!(
            plan.steps[1].get_string("content"),
            Some("now: {{get_time}}")
        );
        assert!(plan.skipped.is_empty());
    }

    #[test]
    fn test_parse_untagged_fence() {
        let response = "```\n[{\"name\": \"calculate\", \"arguments\": {\"expression\": \"1+1\"}}]\n```";
        let plan = parse_plan(response).unwrap();
        assert_eq!(plan.steps[0].arguments["expression"], json!("1+1"));
    }

    #[test]
    fn test_parse_raw_json() {
        let plan = parse_plan(r#"[{"name": "get_time"}]"#).unwrap();
        assert_eq!(plan.steps.len(), 1);
        assert!(plan.steps[0].arguments.is_empty());
    }

    #[test]
    fn test_empty_array_is_empty_plan() {
        assert!(parse_plan("[]").unwrap().steps.is_empty());
    }

    #[test]
    fn test_non_array_is_error() {
        assert_eq!(
            parse_plan(r#"{"name": "get_time"}"#),
            Err(PlanParseError::NotAnArray)
        );
    }

    #[test]
    fn test_prose_is_invalid_json() {
        assert!(matches!(
            parse_plan("I don't need any tools for this."),
            Err(PlanParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_malformed_elements_are_skipped() {
        let plan = parse_plan(
            r#"[{"name": "get_time"}, "oops", {"arguments": {}}, {"name": 3}, {"name": "calculate", "arguments": "bad"}]"#,
        )
        .unwrap();
        let names: Vec<_> = plan.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["get_time", "calculate"]);
        assert!(plan.steps[1].arguments.is_empty());
        assert_eq!(plan.skipped.len(), 3);
    }
}
