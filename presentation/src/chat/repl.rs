//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::ConsoleFormatter;
use crate::output::stream::EventPrinter;
use async_trait::async_trait;
use colored::Colorize;
use council_application::{LlmGateway, SendMessageUseCase};
use council_domain::OutputFormat;
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

const HISTORY_CAPACITY: usize = 1000;

/// Slash commands understood by the REPL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Help,
    Models,
    /// Start a fresh conversation
    New,
    /// List conversations of this session
    List,
    /// Show documents attached to the current conversation
    Sources,
    /// Detach a document from the current conversation
    Detach(String),
    Quit,
    Unknown(String),
}

impl ChatCommand {
    /// Parse a line starting with `/`. Returns `None` for ordinary input.
    pub fn parse(line: &str) -> Option<Self> {
        let cmd = line.trim();
        if !cmd.starts_with('/') {
            return None;
        }
        let (name, arg) = match cmd.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (cmd, ""),
        };
        Some(match name {
            "/quit" | "/exit" | "/q" => ChatCommand::Quit,
            "/help" | "/h" | "/?" => ChatCommand::Help,
            "/models" => ChatCommand::Models,
            "/new" => ChatCommand::New,
            "/list" | "/ls" => ChatCommand::List,
            "/sources" => ChatCommand::Sources,
            "/detach" => ChatCommand::Detach(arg.to_string()),
            other => ChatCommand::Unknown(other.to_string()),
        })
    }
}

/// Documents attached to the REPL's conversations
///
/// The binary implements it over the document retriever so every new
/// conversation starts with the `--attach` files.
#[async_trait]
pub trait ConversationDocuments: Send + Sync {
    /// Attach the session's documents to a new conversation
    async fn prepare(&self, conversation_id: &str);

    /// Attached document names, in attach order
    async fn sources(&self, conversation_id: &str) -> Vec<String>;

    /// Detach a document. Returns false if it was not attached.
    async fn detach(&self, conversation_id: &str, source: &str) -> bool;
}

/// Interactive chat REPL
///
/// Every line is sent to the same conversation, so later turns see the
/// earlier questions and the chairman's answers as history.
pub struct ChatRepl<G: LlmGateway + 'static> {
    use_case: SendMessageUseCase<G>,
    format: OutputFormat,
    stream: bool,
    history_file: Option<PathBuf>,
    documents: Option<Arc<dyn ConversationDocuments>>,
}

impl<G: LlmGateway + 'static> ChatRepl<G> {
    /// Create a new ChatRepl
    pub fn new(use_case: SendMessageUseCase<G>) -> Self {
        Self {
            use_case,
            format: OutputFormat::Synthesis,
            stream: false,
            history_file: default_history_path(),
            documents: None,
        }
    }

    /// Set how batch answers are printed
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Print the synthesis as it streams in
    pub fn with_streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Override the line-history file
    pub fn with_history_file(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.history_file = path;
        }
        self
    }

    /// Manage attached documents for each conversation started by the REPL
    pub fn with_documents(mut self, documents: Arc<dyn ConversationDocuments>) -> Self {
        self.documents = Some(documents);
        self
    }

    /// Run the interactive REPL
    pub async fn run(&self) -> io::Result<()> {
        let mut editor = Reedline::create();
        if let Some(path) = &self.history_file {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match FileBackedHistory::with_file(HISTORY_CAPACITY, path.clone()) {
                Ok(history) => editor = editor.with_history(Box::new(history)),
                Err(e) => warn!(path = %path.display(), error = %e, "History disabled"),
            }
        }
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("council".to_string()),
            DefaultPromptSegment::Empty,
        );

        let mut conversation_id = self.new_conversation().await?;
        self.print_welcome();

        loop {
            match editor.read_line(&prompt)? {
                Signal::Success(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    match ChatCommand::parse(line) {
                        Some(ChatCommand::Quit) => {
                            println!("Bye!");
                            break;
                        }
                        Some(ChatCommand::New) => {
                            conversation_id = self.new_conversation().await?;
                            println!("Started a new conversation.");
                        }
                        Some(ChatCommand::List) => self.print_conversations().await,
                        Some(ChatCommand::Sources) => self.print_sources(&conversation_id).await,
                        Some(ChatCommand::Detach(source)) => {
                            self.detach(&conversation_id, &source).await
                        }
                        Some(ChatCommand::Help) => Self::print_help(),
                        Some(ChatCommand::Models) => self.print_models(),
                        Some(ChatCommand::Unknown(cmd)) => {
                            println!("Unknown command: {}", cmd);
                            println!("Type /help for available commands");
                        }
                        None => self.process_question(&conversation_id, line).await?,
                    }
                }
                Signal::CtrlC => {
                    println!("^C");
                }
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
            }
        }

        Ok(())
    }

    async fn new_conversation(&self) -> io::Result<String> {
        let id = self
            .use_case
            .start_conversation()
            .await
            .map(|c| c.id)
            .map_err(io::Error::other)?;
        if let Some(documents) = &self.documents {
            documents.prepare(&id).await;
        }
        Ok(id)
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│           LLM Council - Chat Mode           │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        self.print_models();
        Self::print_help();
    }

    fn print_help() {
        println!("Commands:");
        println!("  /help, /h, /?    - Show this help");
        println!("  /models          - Show the council");
        println!("  /new             - Start a new conversation");
        println!("  /list            - List conversations");
        println!("  /sources         - Show attached documents");
        println!("  /detach <file>   - Stop using a document as context");
        println!("  /quit, /exit, /q - Exit chat");
        println!();
    }

    fn print_models(&self) {
        let roster = self.use_case.pipeline().roster();
        println!(
            "{} {}",
            "Council:".cyan().bold(),
            roster
                .members()
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!("{} {}", "Chairman:".cyan().bold(), roster.chairman());
        println!();
    }

    async fn print_conversations(&self) {
        match self.use_case.list_conversations().await {
            Ok(conversations) => {
                for c in conversations {
                    println!(
                        "  {}  {}  ({} messages)",
                        c.created_at.format("%Y-%m-%d %H:%M"),
                        c.title,
                        c.message_count
                    );
                }
                println!();
            }
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    async fn print_sources(&self, conversation_id: &str) {
        let sources = match &self.documents {
            Some(documents) => documents.sources(conversation_id).await,
            None => Vec::new(),
        };
        if sources.is_empty() {
            println!("No documents attached.");
        } else {
            for source in sources {
                println!("  * {}", source);
            }
        }
        println!();
    }

    async fn detach(&self, conversation_id: &str, source: &str) {
        if source.is_empty() {
            println!("Usage: /detach <file>");
            return;
        }
        let removed = match &self.documents {
            Some(documents) => documents.detach(conversation_id, source).await,
            None => false,
        };
        if removed {
            println!("Detached {}.", source);
        } else {
            println!("{} is not attached. See /sources.", source);
        }
    }

    async fn process_question(&self, conversation_id: &str, question: &str) -> io::Result<()> {
        println!();

        if self.stream {
            let printer = EventPrinter::new();
            let events = self.use_case.send_streaming(conversation_id, question);
            printer.print(events, &mut io::stdout()).await?;
        } else {
            match self.use_case.send(conversation_id, question).await {
                Ok(result) => {
                    println!("{}", ConsoleFormatter::render(self.format, question, &result));
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                }
            }
        }
        println!();

        Ok(())
    }
}

fn default_history_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("llm-council").join("history.txt"))
}
