use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "compactor")]
#[command(version)]
#[command(about = "Context compaction for long-running agent sessions")]
pub struct Cli {
    #[command(flatten)]
    pub runtime: RuntimeArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that builds a manager
#[derive(Args, Debug, Clone, Default)]
pub struct RuntimeArgs {
    /// Configuration file, JSON or YAML (defaults to ./compact.json, .yaml or .yml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Apply COMPACT_* environment overrides
    #[arg(long, global = true)]
    pub merge_env: bool,

    /// Summarizer used for the remainder
    #[arg(long, global = true, value_enum, default_value_t = SummarizerKind::Auto)]
    pub summarizer: SummarizerKind,

    /// Token counter used for budgets and triggers
    #[arg(long, global = true, value_enum, default_value_t = EstimatorKind::Tiktoken)]
    pub estimator: EstimatorKind,

    /// Archive transcripts and summaries under this directory
    #[arg(long, global = true)]
    pub archive: Option<PathBuf>,

    /// Archive transcripts and summaries into this SQLite database
    #[arg(long, global = true, conflicts_with = "archive")]
    pub archive_db: Option<PathBuf>,

    /// Append telemetry events to this JSONL file instead of the log
    #[arg(long, global = true)]
    pub events_log: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SummarizerKind {
    /// Chat model when OPENAI_API_KEY is set, extractive otherwise
    #[default]
    Auto,
    Chat,
    Extractive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum EstimatorKind {
    /// BPE encoding matching the configured model
    #[default]
    Tiktoken,
    /// Character-class heuristic, no encoding tables
    Heuristic,
}

/// Where to read a JSON message list from
#[derive(Args, Debug, Clone, Default)]
pub struct MessagesInput {
    /// JSON-encoded messages list
    #[arg(long)]
    pub messages: Option<String>,

    /// File holding a JSON messages list (stdin when neither is given)
    #[arg(long, conflicts_with = "messages")]
    pub file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the configuration
    ValidateConfig,

    /// Show the compaction plan without executing it
    DryRun {
        #[command(flatten)]
        input: MessagesInput,
    },

    /// Compact a message list
    Compact {
        #[command(flatten)]
        input: MessagesInput,

        /// Session id used for telemetry and archives
        #[arg(long, default_value = "cli-session")]
        session: String,

        /// Write compacted messages and statistics to this JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a default configuration file
    CreateConfig {
        #[arg(short, long, default_value = compactor_core::DEFAULT_CONFIG_FILE)]
        output: PathBuf,
    },

    /// Print version information
    Version,

    /// Hook: compact before a model call (stdin/stdout JSON)
    #[command(name = "hook:before-model-call")]
    HookBeforeModelCall,
}
