//! CLI entrypoint for stepwise
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use stepwise_application::{
    ChainProgressNotifier, ConversationLogger, ExecutionParams, LlmGateway, LlmPlanner,
    LlmRelevanceJudge, NoChainProgress, RunQueryInput, RunQueryUseCase, ToolExecutorPort,
};
use stepwise_infrastructure::{
    ConfigLoader, FileConfig, FilesystemProvider, JsonlConversationLogger, McpStdioProvider,
    OpenAiConfig, OpenAiGateway, ToolRegistry, UtilityProvider,
};
use stepwise_presentation::{
    ChatRepl, Cli, ConsoleFormatter, OutputFormat, ProgressReporter, ReplConfig,
};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Install the stderr subscriber, plus a file writer when configured.
///
/// The returned guard flushes the file writer on drop.
fn init_logging(verbose: u8, file: Option<&str>) -> Option<WorkerGuard> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match file {
        Some(path) => {
            let path = Path::new(path);
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let name = path.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| "stepwise.log".into());
            let _ = std::fs::create_dir_all(dir);
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

/// `[execution]` overridden by `--max-attempts` (0 lifts the bound)
fn execution_params(config: &FileConfig, max_attempts: Option<u32>) -> ExecutionParams {
    let params = config.execution.to_execution_params();
    match max_attempts {
        Some(0) => params.with_max_attempts_per_step(None),
        Some(n) => params.with_max_attempts_per_step(Some(n)),
        None => params,
    }
}

/// Builtin providers per `[builtin]`, then every reachable `[[servers]]` entry.
async fn build_registry(config: &FileConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    if config.builtin.filesystem_enabled() {
        registry = registry.register(FilesystemProvider::new());
    }
    if config.builtin.utility_enabled() {
        registry = registry.register(UtilityProvider::new());
    }

    for server in &config.servers {
        match McpStdioProvider::connect(server.to_spec()).await {
            Ok(provider) => registry = registry.register(provider),
            Err(e) => warn!(server = %server.id, error = %e, "Skipping MCP server"),
        }
    }
    registry
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    let _log_guard = init_logging(cli.verbose, config.logging.file.as_deref());

    info!("Starting stepwise");

    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("Config error: {}", issue);
        }
        bail!("Invalid configuration ({} issue(s))", issues.len());
    }

    let model = cli.model.clone().unwrap_or_else(|| config.llm.model.clone());
    let execution = execution_params(&config, cli.max_attempts);

    // === Dependency Injection ===
    let mut llm = OpenAiConfig::new(&config.llm.base_url)
        .with_timeout(Duration::from_secs(config.llm.timeout_seconds));
    match config.llm.resolve_api_key() {
        Some(key) => llm = llm.with_api_key(key),
        None => warn!(env = %config.llm.api_key_env, "No API key configured"),
    }
    let gateway: Arc<dyn LlmGateway> =
        Arc::new(OpenAiGateway::new(llm).context("Failed to create LLM gateway")?);

    let mut registry = build_registry(&config).await;
    let bindings = registry.discover().await;
    if !cli.quiet {
        print!("{}", ConsoleFormatter::format_registration(&bindings));
    }
    let tools = registry.catalog().descriptors().cloned().collect::<Vec<_>>();
    info!(tools = tools.len(), "Tool catalog ready");

    let base_dir = cli
        .base_dir
        .clone()
        .or_else(|| config.normalization.base_dir.as_ref().map(PathBuf::from));
    let policy = config.normalization.to_policy(base_dir);

    let mut use_case = RunQueryUseCase::new(
        gateway.clone(),
        Arc::new(registry),
        Arc::new(LlmPlanner::new(gateway.clone(), model.clone())),
        Arc::new(LlmRelevanceJudge::new(gateway, model.clone())),
    )
    .with_normalization(policy);

    let log_path = cli
        .log_conversation
        .clone()
        .or_else(|| config.logging.conversation_log.as_ref().map(PathBuf::from));
    if let Some(path) = log_path {
        match JsonlConversationLogger::new(&path) {
            Some(logger) => {
                info!("Conversation log: {}", path.display());
                let logger: Arc<dyn ConversationLogger> = Arc::new(logger);
                use_case = use_case.with_conversation_logger(logger);
            }
            None => warn!("Conversation logging disabled"),
        }
    }

    // One-shot mode
    if let Some(query) = cli.query {
        let input = RunQueryInput::new(query.clone(), model, execution);
        let outcome = if cli.quiet {
            use_case.execute(input, &NoChainProgress).await?
        } else {
            let progress = ProgressReporter::new();
            let progress: &dyn ChainProgressNotifier = &progress;
            use_case.execute(input, progress).await?
        };

        let output = match cli.output {
            OutputFormat::Answer => ConsoleFormatter::format_answer_only(&outcome),
            OutputFormat::Full => ConsoleFormatter::format(&query, &outcome),
            OutputFormat::Json => ConsoleFormatter::format_json(&query, &outcome),
        };
        println!("{}", output);
        return Ok(());
    }

    // Interactive mode
    let repl_config = ReplConfig {
        show_progress: config.repl.show_progress && !cli.quiet,
        history_file: config.repl.history_file.as_ref().map(PathBuf::from),
        output: cli.output,
    };
    ChatRepl::new(Arc::new(use_case), model)
        .with_execution(execution)
        .with_tools(tools)
        .with_config(repl_config)
        .run()
        .await?;

    Ok(())
}
