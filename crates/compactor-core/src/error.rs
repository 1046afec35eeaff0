//! Error types for the compaction engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompactError>;

#[derive(Debug, Error)]
pub enum CompactError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Protected memory alone cannot fit, even after degrading keep counts
    #[error(
        "protected memory + recent + tool I/O needs {required} tokens but only {available} are \
         available; increase max_context_tokens or reduce protected memory"
    )]
    InsufficientBudget { required: usize, available: i64 },

    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Failure of a single summarization attempt
///
/// Only the fallback controller sees these; they never escape a compaction.
#[derive(Debug, Error)]
pub enum SummarizationError {
    #[error("empty response from summarizer")]
    EmptyResponse,

    #[error("summarization request failed: {0}")]
    Request(String),

    #[error("summarizer unavailable: {0}")]
    Unavailable(String),
}
