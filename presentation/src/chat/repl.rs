//! REPL (Read-Eval-Print Loop) for interactive queries

use std::sync::Arc;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use stepwise_application::{
    ChainProgressNotifier, ExecutionParams, NoChainProgress, RunQueryInput, RunQueryUseCase,
};
use stepwise_domain::ToolDescriptor;

use crate::ConsoleFormatter;
use crate::ProgressReporter;
use crate::cli::commands::OutputFormat;
use crate::config::ReplConfig;

/// What a line of input asks the REPL to do
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Skip,
    Quit,
    Command(&'a str),
    Query(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        Input::Skip
    } else if line == "quit" {
        Input::Quit
    } else if line.starts_with('/') {
        Input::Command(line)
    } else {
        Input::Query(line)
    }
}

/// Interactive query REPL
pub struct ChatRepl {
    use_case: Arc<RunQueryUseCase>,
    model: String,
    execution: ExecutionParams,
    tools: Vec<ToolDescriptor>,
    config: ReplConfig,
}

impl ChatRepl {
    /// Create a new ChatRepl
    pub fn new(use_case: Arc<RunQueryUseCase>, model: impl Into<String>) -> Self {
        Self {
            use_case,
            model: model.into(),
            execution: ExecutionParams::default(),
            tools: Vec::new(),
            config: ReplConfig::default(),
        }
    }

    pub fn with_execution(mut self, execution: ExecutionParams) -> Self {
        self.execution = execution;
        self
    }

    /// Tools listed by `/tools`
    pub fn with_tools(mut self, tools: Vec<ToolDescriptor>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_config(mut self, config: ReplConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the interactive REPL
    pub async fn run(&self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        let history_path = self.config.history_path();
        if let Some(ref path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            match rl.readline("stepwise> ") {
                Ok(line) => match classify(&line) {
                    Input::Skip => continue,
                    Input::Quit => {
                        println!("Bye!");
                        break;
                    }
                    Input::Command(cmd) => {
                        if self.handle_command(cmd) {
                            break;
                        }
                    }
                    Input::Query(query) => {
                        let _ = rl.add_history_entry(query);
                        self.process_query(query).await;
                    }
                },
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = history_path {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│            Stepwise - Interactive           │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Model: {}", self.model);
        println!("Tools: {}", self.tools.len());
        println!();
        println!("Type a request, or quit to exit. /help lists commands.");
        println!();
    }

    /// Handle slash commands. Returns true if should exit.
    fn handle_command(&self, cmd: &str) -> bool {
        match cmd {
            "/quit" | "/exit" | "/q" => {
                println!("Bye!");
                true
            }
            "/help" | "/h" | "/?" => {
                println!();
                println!("Commands:");
                println!("  /help, /h, /?    - Show this help");
                println!("  /tools           - List available tools");
                println!("  quit, /quit, /q  - Exit");
                println!();
                false
            }
            "/tools" => {
                println!();
                if self.tools.is_empty() {
                    println!("No tools available");
                }
                for tool in &self.tools {
                    println!("  {} - {}", tool.name.bold(), tool.description);
                }
                println!();
                false
            }
            _ => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
                false
            }
        }
    }

    async fn process_query(&self, query: &str) {
        println!();

        let input = RunQueryInput::new(query, &self.model, self.execution.clone());
        let reporter;
        let progress: &dyn ChainProgressNotifier = if self.config.show_progress {
            reporter = ProgressReporter::new();
            &reporter
        } else {
            &NoChainProgress
        };

        match self.use_case.execute(input, progress).await {
            Ok(outcome) => {
                let output = match self.config.output {
                    OutputFormat::Answer => ConsoleFormatter::format_answer_only(&outcome),
                    OutputFormat::Full => ConsoleFormatter::format(query, &outcome),
                    OutputFormat::Json => ConsoleFormatter::format_json(query, &outcome),
                };
                println!("{}", output);
            }
            Err(e) => {
                println!("{} {}", "Error:".red().bold(), e);
            }
        }
        println!();
    }
}
