//! Prompt templates for planning, relevance judgment and synthesis

use crate::tool::entities::ToolDescriptor;

/// Prepended to arithmetic outputs in the synthesis transcript.
pub const ARITHMETIC_OUTPUT_PREFIX: &str =
    "Do not format the following number with LaTeX or Markdown: ";

/// Templates for the chain engine's LLM calls
pub struct ChainPromptTemplate;

impl ChainPromptTemplate {
    /// System prompt for the planner, listing every available tool.
    pub fn planner_system<'a>(tools: impl IntoIterator<Item = &'a ToolDescriptor>) -> String {
        let tool_list = tools
            .into_iter()
            .map(|t| {
                let args = t.argument_names();
                if args.is_empty() {
                    format!("- {}: {}", t.name, t.description)
                } else {
                    format!("- {}: {} (arguments: {})", t.name, t.description, args.join(", "))
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"You are a task-planning assistant with access to a set of tools.
The user will give you a request in natural language. Split it into sub-tasks
so that each sub-task can be solved by one of the tools below.

Available tools (use these names exactly):
{tool_list}

Return the tools chosen for the sub-tasks, in execution order. When a step
needs the output of an earlier step, write {{{{tool_name}}}} inside an argument
value, where tool_name is the earlier step's tool.

Response format: a JSON array where every element is an object with a "name"
field and an "arguments" object.

Do not answer in natural language and do not use tool names that are not
listed above."#
        )
    }

    /// System prompt for the relevance judge
    pub fn judge_system() -> &'static str {
        r#"You are an assistant that is good at analysing the relationship between two pieces of text.
Decide whether the answer can serve as context for solving the user's query, is related to the query, or helps resolve it.
Answers that count as context include a retrieved time such as "2025年05月29日 10:00:26", text related to the query such as reference material, and intermediate status reached while resolving the query, such as a file being created, written, or an email being sent.
If the answer can serve as context reply "True", otherwise reply "False".
Reply with True or False only, nothing else."#
    }

    /// User message for the relevance judge
    pub fn judge_user(query: &str, output: &str) -> String {
        format!("User query: \"{}\"\nAnswer: {}", query, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planner_prompt_lists_tools_and_placeholder_syntax() {
        let tools = vec![
            ToolDescriptor::new("get_time", "Current local time"),
            ToolDescriptor::new("create_file", "Create a file")
                .with_string_arg("file_name", "Name", true)
                .with_string_arg("content", "Body", false),
        ];
        let prompt = ChainPromptTemplate::planner_system(&tools);

        assert!(prompt.contains("- get_time: Current local time"));
        assert!(prompt.contains("- create_file: Create a file (arguments: "));
        assert!(prompt.contains("{{tool_name}}"));
        assert!(prompt.contains("JSON array"));
    }

    #[test]
    fn test_judge_user_message_carries_both_texts() {
        let msg = ChainPromptTemplate::judge_user("what time?", "10:00");
        assert!(msg.contains("what time?"));
        assert!(msg.ends_with("Answer: 10:00"));
    }
}
