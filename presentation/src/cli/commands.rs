//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for query results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The answer plus warnings for abandoned steps
    Answer,
    /// Answer, accepted steps and abandoned steps
    Full,
    /// JSON output
    Json,
}

/// CLI arguments for stepwise
#[derive(Parser, Debug)]
#[command(name = "stepwise")]
#[command(author, version, about = "Answer requests by planning and running a chain of tool calls")]
#[command(long_about = r#"
Stepwise turns a natural-language request into a chain of tool calls.

For every query:
1. Plan: the model proposes an ordered list of tool calls, where an argument
   may reference an earlier tool's output as {{tool_name}}
2. Execute: steps run one at a time; a step whose references are not yet
   available, whose tool reports an error, or whose output is judged
   irrelevant goes back to the end of the queue
3. Answer: the model writes the final reply from the accepted tool results

Configuration files are loaded from (in priority order):
1. STEPWISE_* environment variables
2. --config <path>     Explicit config file
3. ./stepwise.toml     Project-level config
4. ~/.config/stepwise/config.toml   Global config

Example:
  stepwise "What time is it? Save it to now.txt"
  stepwise -m gpt-4o "What is (3 + 4) * 12?"
  stepwise              # interactive mode, type quit to exit
"#)]
pub struct Cli {
    /// The request to answer (omit for interactive mode)
    pub query: Option<String>,

    /// Model used for planning, judging and the final answer
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Directory file paths are anchored under
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Failed attempts before a step is abandoned (0 = retry without bound)
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "answer")]
    pub output: OutputFormat,

    /// Append a JSONL conversation log to this file
    #[arg(long, value_name = "PATH")]
    pub log_conversation: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators and step traces
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
