//! Telemetry exporters for compaction events

mod console;
mod http;
mod jsonl;

pub use console::ConsoleExporter;
pub use http::{HttpExporter, DEFAULT_EXPORT_URL, EXPORT_TIMEOUT, MAX_PENDING_EVENTS};
pub use jsonl::JsonlExporter;
