//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for council results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Only the chairman's final answer
    Synthesis,
    /// Every stage: answers, rankings and synthesis
    Full,
    /// Raw stage payloads as JSON
    Json,
}

impl From<OutputFormat> for council_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Synthesis => council_domain::OutputFormat::Synthesis,
            OutputFormat::Full => council_domain::OutputFormat::Full,
            OutputFormat::Json => council_domain::OutputFormat::Json,
        }
    }
}

/// CLI arguments for llm-council
#[derive(Parser, Debug)]
#[command(name = "llm-council")]
#[command(author, version, about = "LLM Council - several models answer, rank each other, and a chairman decides")]
#[command(long_about = r#"
LLM Council sends your question to a council of models and records the
whole deliberation in a local SQLite database.

Each turn has three stages:
1. Responses: every council model answers in parallel
2. Rankings: each model ranks the anonymized answers
3. Synthesis: the chairman model writes the final answer

Configuration files are loaded from (in priority order):
1. COUNCIL_* environment variables (e.g. COUNCIL_BACKEND__TIMEOUT_SECONDS=30)
2. --config <path>     Explicit config file
3. ./council.toml      Project-level config
4. ~/.config/llm-council/config.toml   Global config

Example:
  llm-council ask "What's the best way to handle errors in Rust?"
  llm-council ask --conversation 5f0c... "And in async code?"
  llm-council -m llama-3.1-8b-instant -m openai/gpt-oss-20b ask "Compare the two"
  llm-council list
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Models to include in the council (can be specified multiple times)
    #[arg(short, long, value_name = "MODEL", global = true)]
    pub model: Vec<String>,

    /// Model that writes the final synthesis
    #[arg(long, value_name = "MODEL", global = true)]
    pub chairman: Option<String>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and the effective configuration, then exit
    #[arg(long)]
    pub show_config: bool,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ask the council a question
    Ask {
        /// The question to ask
        question: String,

        /// Conversation to continue (a new one is created when omitted)
        #[arg(short, long, value_name = "ID")]
        conversation: Option<String>,

        /// Output format (defaults to [output].format, then synthesis)
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,
    },

    /// List stored conversations, newest first
    List,

    /// Print a stored conversation
    Show {
        /// Conversation identifier
        id: String,

        /// Print the stored JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Rename a conversation
    Rename {
        /// Conversation identifier
        id: String,

        /// New title
        title: String,
    },

    /// Send a short greeting to every council model and the chairman
    Check,
}
