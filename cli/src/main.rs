//! CLI entrypoint for LLM Council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use council_application::{
    ChairmanSynthesisStage, CheckBackendsUseCase, ConversationStore, NoProgress, PeerRankingStage,
    ProgressNotifier, QueryCouncilUseCase, RunCouncilInput, RunCouncilUseCase,
};
use council_domain::{Model, OutputFormat};
use council_infrastructure::{ChatCompletionsGateway, ConfigLoader, FileConfig, SqliteConversationStore};
use council_presentation::{Cli, Command, ConsoleFormatter, OutputFormatter, ProgressReporter};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    info!("Starting LLM Council");

    let config = load_config(&cli)?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        println!();
        println!("{}", toml::to_string_pretty(&config.redacted())?);
        return Ok(());
    }

    if !config.output.color {
        colored::control::set_override(false);
    }

    let Some(command) = cli.command.clone() else {
        bail!("No command given. Try `llm-council ask \"<question>\"` or `llm-council --help`.");
    };

    match command {
        Command::Ask {
            question,
            conversation,
            output,
        } => {
            let format = output
                .map(OutputFormat::from)
                .or(config.output.format)
                .unwrap_or_default();
            ask(&config, question, conversation, format, cli.quiet).await
        }
        Command::List => {
            let store = open_store(&config).await?;
            let summaries = store.list_conversations().await?;
            print!("{}", ConsoleFormatter::format_conversation_list(&summaries));
            Ok(())
        }
        Command::Show { id, json } => {
            let store = open_store(&config).await?;
            let conversation = store
                .get_conversation(&id)
                .await?
                .ok_or_else(|| anyhow!("Conversation not found: {}", id))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&conversation)?);
            } else {
                print!("{}", ConsoleFormatter::format_conversation(&conversation));
            }
            Ok(())
        }
        Command::Rename { id, title } => {
            let store = open_store(&config).await?;
            store.update_conversation_title(&id, &title).await?;
            println!("Renamed {} to {:?}", id, title);
            Ok(())
        }
        Command::Check => check(&config, cli.quiet).await,
    }
}

/// Install the tracing subscriber: stderr always, plus an optional log file.
///
/// `RUST_LOG` overrides the level chosen by `-v`.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow!("--log-file must name a file: {}", path.display()))?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Load, override from flags, and validate the configuration
fn load_config(cli: &Cli) -> Result<FileConfig> {
    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        if let Some(path) = &cli.config {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
        }
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    if !cli.model.is_empty() {
        config.council.models = cli.model.iter().map(Model::new).collect();
    }
    if let Some(chairman) = &cli.chairman {
        config.council.chairman = Model::new(chairman);
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn open_store(config: &FileConfig) -> Result<Arc<SqliteConversationStore>> {
    let store = SqliteConversationStore::open(
        &config.storage.database_path,
        config.storage.pool_size,
    )
    .with_context(|| {
        format!(
            "Failed to open database {}",
            config.storage.database_path.display()
        )
    })?;
    store.init().await?;
    Ok(Arc::new(store))
}

fn gateway(config: &FileConfig) -> Result<Arc<ChatCompletionsGateway>> {
    let gateway = ChatCompletionsGateway::new(
        config.backend.api_url.clone(),
        config.backend.resolve_api_key(),
    )?;
    if !gateway.has_credentials() {
        warn!(
            "No API key found (set {} or backend.api_key); every backend call will fail",
            config.backend.api_key_env
        );
    }
    Ok(Arc::new(gateway))
}

async fn ask(
    config: &FileConfig,
    question: String,
    conversation: Option<String>,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let store = open_store(config).await?;
    let gateway = gateway(config)?;
    let council = config.to_council_config();

    // === Dependency Injection ===
    let progress: Arc<dyn ProgressNotifier> = if quiet {
        Arc::new(NoProgress)
    } else {
        Arc::new(ProgressReporter::new())
    };

    let query = QueryCouncilUseCase::new(gateway).with_timeout(council.timeout);
    let ranking = PeerRankingStage::new(query.clone()).with_progress(Arc::clone(&progress));
    let synthesis = ChairmanSynthesisStage::new(query.clone(), council.chairman.clone())
        .with_progress(Arc::clone(&progress));
    let use_case = RunCouncilUseCase::new(
        query,
        Arc::clone(&store),
        Arc::new(ranking),
        Arc::new(synthesis),
        &council,
    );

    let conversation_id = conversation.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    store.create_conversation(&conversation_id).await?;

    let turn = use_case
        .execute_with_progress(
            RunCouncilInput::new(conversation_id, question),
            progress.as_ref(),
        )
        .await?;

    println!("{}", ConsoleFormatter.render(&turn, format));
    Ok(())
}

async fn check(config: &FileConfig, quiet: bool) -> Result<()> {
    let gateway = gateway(config)?;
    let use_case = CheckBackendsUseCase::new(gateway, &config.to_council_config());

    if !quiet {
        println!("Endpoint: {}", config.backend.api_url);
    }

    let results = if quiet {
        use_case.execute().await
    } else {
        let progress = ProgressReporter::new();
        use_case.execute_with_progress(&progress).await
    };

    print!("{}", ConsoleFormatter::format_check(&results));

    if results.all_failed() {
        bail!("No backend responded");
    }
    Ok(())
}
