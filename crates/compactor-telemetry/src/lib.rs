//! Token estimation, event export and JSONL utilities for compaction telemetry

mod bpe;
mod exporters;
mod io;
mod tokens;
mod types;

pub use bpe::{EncodingError, TiktokenEstimator};
pub use exporters::{
    ConsoleExporter, HttpExporter, JsonlExporter, DEFAULT_EXPORT_URL, EXPORT_TIMEOUT,
    MAX_PENDING_EVENTS,
};
pub use io::{append_jsonl, atomic_write, read_jsonl, write_jsonl};
pub use tokens::{estimate_tokens, HeuristicEstimator, MESSAGE_OVERHEAD};
pub use types::{EventRecord, SpanEvent};
