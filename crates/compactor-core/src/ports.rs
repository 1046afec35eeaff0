//! Collaborator interfaces injected into the manager

use crate::error::SummarizationError;
use crate::types::{CompactPolicy, Message};

/// Token counting, supplied by the host
///
/// Implementations must be total and free of observable side effects.
pub trait TokenEstimator: Send + Sync {
    fn estimate_tokens(&self, text: &str) -> usize;

    fn estimate_messages_tokens(&self, messages: &[Message]) -> usize;

    fn estimate_tools_tokens(&self, tools: &[serde_json::Value]) -> usize;

    fn estimate_system_tokens(&self, system_prompt: &str) -> usize {
        self.estimate_tokens(system_prompt)
    }
}

/// Single-shot summarization
///
/// Retry policy belongs to [`crate::summarize_with_fallback`], not to
/// implementations.
pub trait Summarizer: Send + Sync {
    fn summarize(
        &self,
        messages: &[Message],
        max_tokens: usize,
        policy: &CompactPolicy,
    ) -> Result<String, SummarizationError>;
}

/// Telemetry sink
///
/// `emit_event` buffers; `flush` delivers and must log, not propagate,
/// delivery failures.
pub trait Exporter: Send + Sync {
    fn emit_event(
        &mut self,
        event_type: &str,
        properties: serde_json::Value,
        payload: Option<serde_json::Value>,
    );

    fn flush(&mut self);
}

/// Transcript archive; redaction before write is the adapter's job
pub trait StorageAdapter: Send + Sync {
    fn save_transcript(
        &self,
        session_id: &str,
        messages: &[Message],
        step: u32,
    ) -> anyhow::Result<()>;

    fn save_summary(&self, session_id: &str, summary: &Message, step: u32) -> anyhow::Result<()>;

    fn save_event(&self, session_id: &str, event: &serde_json::Value) -> anyhow::Result<()>;
}

/// Estimator returning a fixed count per text, message, or tool list
#[derive(Debug, Clone, Copy)]
pub struct FixedEstimator {
    pub default_tokens: usize,
}

impl FixedEstimator {
    pub fn new(default_tokens: usize) -> Self {
        Self { default_tokens }
    }
}

impl Default for FixedEstimator {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl TokenEstimator for FixedEstimator {
    fn estimate_tokens(&self, _text: &str) -> usize {
        self.default_tokens
    }

    fn estimate_messages_tokens(&self, messages: &[Message]) -> usize {
        messages.len() * self.default_tokens
    }

    fn estimate_tools_tokens(&self, _tools: &[serde_json::Value]) -> usize {
        self.default_tokens
    }
}

/// Exporter that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullExporter;

impl Exporter for NullExporter {
    fn emit_event(&mut self, _: &str, _: serde_json::Value, _: Option<serde_json::Value>) {}

    fn flush(&mut self) {}
}
