//! Presentation-level configuration
//!
//! Configuration for REPL behavior, built by the binary from the `[repl]`
//! section and CLI flags.

use std::path::PathBuf;

use crate::cli::commands::OutputFormat;

/// REPL configuration for the presentation layer
#[derive(Debug, Clone)]
pub struct ReplConfig {
    /// Show spinners and step traces
    pub show_progress: bool,
    /// Path to history file; `None` uses the data dir
    pub history_file: Option<PathBuf>,
    /// How each answer is printed
    pub output: OutputFormat,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            history_file: None,
            output: OutputFormat::Answer,
        }
    }
}

impl ReplConfig {
    /// Configured history file, else `$XDG_DATA_HOME/stepwise/history.txt`
    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_file
            .clone()
            .or_else(|| dirs::data_dir().map(|p| p.join("stepwise").join("history.txt")))
    }
}
