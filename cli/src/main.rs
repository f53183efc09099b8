//! CLI entrypoint for llm-council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use clap::Parser;
use council_application::{CouncilPipeline, NoProgress, ProgressNotifier, SendMessageUseCase};
use council_domain::{OutputFormat, Question};
use council_infrastructure::{
    ConcurrencyGate, ConfigLoader, FileConfig, InMemoryConversationStore,
    JsonlConversationLogger, LocalDocumentRetriever, OpenRouterClient, OpenRouterSettings,
    TextChunker,
};
use council_presentation::{
    ChatRepl, Cli, ConsoleFormatter, ConversationDocuments, EventPrinter, ProgressReporter,
    SimpleProgress,
};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Attaches the `--attach` files to every conversation it is asked to prepare.
struct AttachFiles {
    retriever: Arc<LocalDocumentRetriever>,
    paths: Vec<PathBuf>,
}

#[async_trait]
impl ConversationDocuments for AttachFiles {
    async fn prepare(&self, conversation_id: &str) {
        for path in &self.paths {
            match self.retriever.add_file(conversation_id, path).await {
                Ok(chunks) => info!(path = %path.display(), chunks, "Attached document"),
                Err(e) => warn!("Skipping attachment: {}", e),
            }
        }
    }

    async fn sources(&self, conversation_id: &str) -> Vec<String> {
        self.retriever.sources(conversation_id).await
    }

    async fn detach(&self, conversation_id: &str, source: &str) -> bool {
        self.retriever.remove_source(conversation_id, source).await
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    info!("Starting llm-council");

    // === Configuration ===
    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        println!();
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow::anyhow!("failed to load configuration: {}", e))?
    };
    apply_cli_overrides(&mut config, &cli);

    if cli.show_config {
        println!("Effective configuration:");
        println!("{}", config.to_redacted_toml()?);
        return Ok(());
    }

    config.validate()?;
    let roster = config.roster()?;
    let api_key = config.api_key()?;

    if !config.output.color {
        colored::control::set_override(false);
    }
    let format = cli
        .output_format()
        .or(config.output.format)
        .unwrap_or(OutputFormat::Synthesis);

    // === Dependency Injection ===
    let gate = ConcurrencyGate::new(config.limits.concurrency);
    let settings = OpenRouterSettings::new(&config.openrouter.api_url, api_key).with_attribution(
        config.openrouter.referer.clone(),
        config.openrouter.app_title.clone(),
    );
    let gateway = Arc::new(OpenRouterClient::new(settings, gate, config.retry_policy())?);

    let mut pipeline = CouncilPipeline::new(gateway, roster, config.engine_params());
    if let Some(path) = &config.logging.conversation_log {
        let session = chrono::Utc::now().format("%Y%m%dT%H%M%S").to_string();
        let logger = JsonlConversationLogger::open(path, session)
            .with_context(|| format!("failed to open conversation log {}", path))?;
        pipeline = pipeline.with_conversation_logger(Arc::new(logger));
    }

    let retriever = Arc::new(LocalDocumentRetriever::new(TextChunker::new(
        config.retrieval.chunk_size,
        config.retrieval.chunk_overlap,
    )));
    let attachments = Arc::new(AttachFiles {
        retriever: retriever.clone(),
        paths: cli.attach.clone(),
    });

    let show_progress = !cli.quiet && (!cli.chat || config.repl.show_progress);
    let progress: Arc<dyn ProgressNotifier> = if !show_progress {
        Arc::new(NoProgress)
    } else if std::io::stderr().is_terminal() {
        Arc::new(ProgressReporter::new())
    } else {
        Arc::new(SimpleProgress)
    };

    let use_case = SendMessageUseCase::new(pipeline, Arc::new(InMemoryConversationStore::new()))
        .with_retriever(retriever)
        .with_progress(progress);

    // Chat mode
    if cli.chat {
        let repl = ChatRepl::new(use_case)
            .with_format(format)
            .with_streaming(cli.stream)
            .with_history_file(config.repl.history_file.as_ref().map(PathBuf::from))
            .with_documents(attachments);

        repl.run().await?;
        return Ok(());
    }

    // Single question mode - question is required
    let question = match cli.question {
        Some(q) => Question::new(q)?.into_content(),
        None => bail!("Question is required. Use --chat for interactive mode."),
    };

    if cli.stream && format == OutputFormat::Json {
        bail!("--stream prints text as it arrives and cannot be combined with --output json");
    }

    let conversation = use_case.start_conversation().await?;
    attachments.prepare(&conversation.id).await;

    if !cli.quiet && format != OutputFormat::Json {
        let roster = use_case.pipeline().roster();
        println!();
        println!("Question: {}", question);
        println!(
            "Council: {} (chairman: {})",
            roster
                .members()
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            roster.chairman()
        );
        println!();
    }

    if cli.stream {
        let printer = EventPrinter::new()
            .with_stage1(format == OutputFormat::Full)
            .with_status(!cli.quiet);
        let events = use_case.send_streaming(&conversation.id, &question);
        let summary = printer.print(events, &mut std::io::stdout()).await?;
        if let Some(error) = summary.error {
            bail!(error);
        }
        return Ok(());
    }

    let result = use_case.send(&conversation.id, &question).await?;
    println!("{}", ConsoleFormatter::render(format, &question, &result));

    Ok(())
}

/// Command-line flags take precedence over every configuration source.
fn apply_cli_overrides(config: &mut FileConfig, cli: &Cli) {
    if !cli.model.is_empty() {
        config.council.models = cli.model.clone();
    }
    if let Some(chairman) = &cli.chairman {
        config.council.chairman = chairman.clone();
    }
    if let Some(concurrency) = cli.concurrency {
        config.limits.concurrency = concurrency;
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over the `-v` count.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .with_context(|| format!("--log-file {} has no file name", path.display()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();

    Ok(Some(guard))
}
