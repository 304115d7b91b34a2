//! Console output formatter for query outcomes

use colored::Colorize;
use serde_json::json;
use stepwise_domain::util::truncate_str;
use stepwise_domain::{AbandonedStep, QueryOutcome, ToolBinding};

/// Formats query outcomes for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Answer, accepted steps and abandoned steps
    pub fn format(query: &str, outcome: &QueryOutcome) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Stepwise Result"));
        output.push('\n');
        output.push_str(&format!("{} {}\n", "Query:".cyan().bold(), query));

        output.push_str(&Self::section_header("Accepted Steps"));
        if outcome.accepted.is_empty() {
            output.push_str(&format!("{}\n", "  (none)".dimmed()));
        }
        for accepted in &outcome.accepted {
            output.push_str(&format!(
                "  {} {}. {} {}\n",
                "v".green(),
                accepted.ordinal,
                accepted.step.name.bold(),
                accepted.step.arguments_json().dimmed()
            ));
            output.push_str(&format!(
                "{}\n",
                Self::indent(truncate_str(&accepted.output, 300), "       ")
            ));
        }

        if !outcome.abandoned.is_empty() {
            output.push_str(&Self::section_header("Abandoned Steps"));
            for abandoned in &outcome.abandoned {
                output.push_str(&Self::abandoned_line(abandoned));
            }
        }

        output.push_str(&Self::section_header("Answer"));
        output.push_str(&outcome.answer);
        output.push('\n');
        output.push_str(&Self::footer());

        output
    }

    /// The answer, followed by a warning per abandoned step
    pub fn format_answer_only(outcome: &QueryOutcome) -> String {
        let mut output = String::new();
        output.push_str(&outcome.answer);
        output.push('\n');

        if !outcome.abandoned.is_empty() {
            output.push_str(&format!(
                "\n{}\n",
                format!(
                    "Warning: {} step(s) were abandoned; the answer may be incomplete",
                    outcome.abandoned.len()
                )
                .yellow()
                .bold()
            ));
            for abandoned in &outcome.abandoned {
                output.push_str(&Self::abandoned_line(abandoned));
            }
        }

        output
    }

    /// Format as JSON
    pub fn format_json(query: &str, outcome: &QueryOutcome) -> String {
        let value = json!({
            "query": query,
            "answer": outcome.answer,
            "accepted": outcome.accepted.iter().map(|a| json!({
                "ordinal": a.ordinal,
                "tool": a.step.name,
                "arguments": a.step.arguments,
                "output": a.output,
            })).collect::<Vec<_>>(),
            "abandoned": outcome.abandoned.iter().map(|a| json!({
                "ordinal": a.ordinal,
                "tool": a.step.name,
                "arguments": a.step.arguments,
                "attempts": a.attempts,
                "reason": a.reason.kind(),
                "detail": a.reason.to_string(),
            })).collect::<Vec<_>>(),
        });
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }

    /// One line per tool binding, as printed at startup
    pub fn format_registration(bindings: &[ToolBinding]) -> String {
        let mut output = String::new();
        for binding in bindings {
            output.push_str(&format!(
                "{} {} {} {}\n",
                "Registered tool".dimmed(),
                binding.name.bold(),
                "from".dimmed(),
                binding.provider_id.cyan()
            ));
        }
        output
    }

    fn abandoned_line(abandoned: &AbandonedStep) -> String {
        format!(
            "  {} {}. {} after {} attempt(s): {}\n",
            "x".red(),
            abandoned.ordinal,
            abandoned.step.name.bold(),
            abandoned.attempts,
            abandoned.reason
        )
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
