//! Progress reporting for chain execution
//!
//! LLM calls (planning, judging, synthesis) show a spinner; every other
//! event prints one trace line.

use std::sync::Mutex;
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use stepwise_application::ChainProgressNotifier;
use stepwise_domain::util::truncate_str;
use stepwise_domain::{AbandonedStep, PlanStep, QueuedStep, StepFailure, Verdict};

/// Output previews are cut to this many bytes
const PREVIEW_BYTES: usize = 200;

/// Reports chain progress with a spinner and colored step traces
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn start_spinner(&self, message: String) {
        self.stop_spinner();
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut slot) = self.spinner.lock() {
            *slot = Some(pb);
        }
    }

    fn stop_spinner(&self) {
        if let Ok(mut slot) = self.spinner.lock()
            && let Some(pb) = slot.take()
        {
            pb.finish_and_clear();
        }
    }

    fn line(&self, text: String) {
        self.stop_spinner();
        println!("{}", text);
    }

    fn preview(output: &str) -> String {
        let first = truncate_str(output, PREVIEW_BYTES);
        let first = first.replace('\n', " ");
        if first.len() < output.len() {
            format!("{}...", first)
        } else {
            first
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainProgressNotifier for ProgressReporter {
    fn on_planning_start(&self) {
        self.start_spinner("Planning tool calls...".to_string());
    }

    fn on_plan_ready(&self, steps: &[PlanStep]) {
        if steps.is_empty() {
            self.line(format!("{} {}", "->".cyan(), "No tool calls planned".dimmed()));
            return;
        }
        self.line(format!(
            "{} {} ({} steps)",
            "->".cyan(),
            "Plan".bold(),
            steps.len()
        ));
        for (i, step) in steps.iter().enumerate() {
            println!(
                "   {}. {} {}",
                i + 1,
                step.name,
                step.arguments_json().dimmed()
            );
        }
    }

    fn on_step_start(&self, call_number: usize, step: &PlanStep, provider_id: Option<&str>) {
        self.line(format!(
            "{} Tool call #{}: {} {} {}",
            "->".cyan(),
            call_number,
            step.name.bold(),
            step.arguments_json().dimmed(),
            provider_id
                .map(|id| format!("[{}]", id))
                .unwrap_or_else(|| "[unbound]".to_string())
                .dimmed()
        ));
    }

    fn on_step_output(&self, _step: &PlanStep, output: &str) {
        self.line(format!("   {} {}", "<-".dimmed(), Self::preview(output)));
    }

    fn on_judging(&self, step: &PlanStep) {
        self.start_spinner(format!("Judging relevance of {}...", step.name));
    }

    fn on_verdict(&self, _step: &PlanStep, verdict: Verdict) {
        let label = match verdict {
            Verdict::Admissible => verdict.as_str().green(),
            Verdict::NotAdmissible => verdict.as_str().yellow(),
        };
        self.line(format!("   {} {}", "verdict:".dimmed(), label));
    }

    fn on_step_accepted(&self, ordinal: usize, step: &PlanStep) {
        self.line(format!("   {} step {} ({}) accepted", "v".green(), ordinal, step.name));
    }

    fn on_step_requeued(&self, step: &QueuedStep, reason: &StepFailure) {
        self.line(format!(
            "   {} step {} ({}) requeued: {}",
            "~".yellow(),
            step.ordinal,
            step.step.name,
            reason
        ));
    }

    fn on_step_abandoned(&self, step: &AbandonedStep) {
        self.line(format!(
            "   {} step {} ({}) abandoned after {} attempt(s): {}",
            "x".red(),
            step.ordinal,
            step.step.name,
            step.attempts,
            step.reason
        ));
    }

    fn on_synthesis_start(&self, accepted: usize) {
        self.start_spinner(format!("Writing the answer from {} tool result(s)...", accepted));
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.stop_spinner();
    }
}
