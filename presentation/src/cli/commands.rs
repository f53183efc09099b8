//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for council results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Stage 1 answers and the final synthesis
    Full,
    /// Only the final synthesis
    Synthesis,
    /// JSON output
    Json,
}

impl From<OutputFormat> for council_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => council_domain::OutputFormat::Full,
            OutputFormat::Synthesis => council_domain::OutputFormat::Synthesis,
            OutputFormat::Json => council_domain::OutputFormat::Json,
        }
    }
}

/// CLI arguments for llm-council
#[derive(Parser, Debug)]
#[command(name = "llm-council")]
#[command(author, version, about = "LLM Council - several models answer, a chairman synthesizes")]
#[command(long_about = r#"
llm-council sends your question to a council of models on OpenRouter.

The process has two stages:
1. Collect: every council member answers your question in parallel
2. Synthesis: the chairman model reads all answers and writes the final one

Configuration files are loaded from (in priority order):
1. COUNCIL_* environment variables (e.g. COUNCIL_LIMITS__CONCURRENCY=4)
2. --config <path>     Explicit config file
3. ./council.toml      Project-level config (or ./.council.toml)
4. ~/.config/llm-council/config.toml   Global config

The API key is read from OPENROUTER_API_KEY unless configured otherwise.

Example:
  llm-council "What's the best way to handle errors in Rust?"
  llm-council -m openai/gpt-4o -m anthropic/claude-3.5-sonnet --chairman google/gemini-pro "Compare async runtimes"
  llm-council --stream --attach notes.md "Summarize my notes"
  llm-council --chat
"#)]
pub struct Cli {
    /// The question to ask the council (not required in chat mode)
    pub question: Option<String>,

    /// Start interactive chat mode
    #[arg(short, long)]
    pub chat: bool,

    /// Print the chairman's synthesis as it is generated
    #[arg(short, long)]
    pub stream: bool,

    /// Models to include in the council (can be specified multiple times)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Vec<String>,

    /// Model that synthesizes the final answer
    #[arg(long, value_name = "MODEL")]
    pub chairman: Option<String>,

    /// Maximum number of concurrent model requests
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Files to use as retrieval context (can be specified multiple times)
    #[arg(short, long, value_name = "PATH")]
    pub attach: Vec<PathBuf>,

    /// Output format (defaults to the configured format, then synthesis)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and the effective configuration, then exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Output format chosen on the command line, if any
    pub fn output_format(&self) -> Option<council_domain::OutputFormat> {
        self.output.map(Into::into)
    }
}
