//! Context compaction decisions: when to compact, what to keep, what to summarize

mod config;
mod error;
mod fallback;
mod manager;
mod partition;
mod ports;
mod types;

pub use config::{
    create_example_config, ConfigLoader, CONFIG_FILE_CANDIDATES, DEFAULT_CONFIG_FILE,
};
pub use error::{CompactError, Result, SummarizationError};
pub use fallback::{summarize_with_fallback, DEFAULT_MAX_RETRIES, MIN_SUMMARY_TOKENS};
pub use manager::{events, CompactManager, MAX_DEGRADATIONS, SUMMARY_LABEL, SUMMARY_PREFIX};
pub use partition::{reduce_keep_counts, MessagePartitioner, Partition, RESPONSE_RESERVE};
pub use ports::{Exporter, FixedEstimator, NullExporter, StorageAdapter, Summarizer, TokenEstimator};
pub use types::{
    CompactConfig, CompactPolicy, CompactionResult, ConfigSettings, KeptCounts, Message,
    PolicySettings, Strategy, TokenBudget, DEVELOPER_ROLE, LABEL_KEY, PROTECTED_KEY, TOOL_ROLE,
    TURN_ROLES,
};
