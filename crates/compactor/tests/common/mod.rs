#![allow(dead_code)]

use compactor_core::{
    CompactConfig, CompactManager, CompactPolicy, ConfigSettings, Exporter, FixedEstimator,
    Message, PolicySettings, SummarizationError, Summarizer,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Flushed events, shared with the test after the exporter is boxed
pub type EventLog = Arc<Mutex<Vec<(String, Value)>>>;

pub struct SharedExporter {
    flushed: EventLog,
    pending: Vec<(String, Value)>,
}

impl SharedExporter {
    pub fn new() -> (Self, EventLog) {
        let log = EventLog::default();
        (
            Self {
                flushed: Arc::clone(&log),
                pending: Vec::new(),
            },
            log,
        )
    }
}

impl Exporter for SharedExporter {
    fn emit_event(&mut self, event_type: &str, properties: Value, _payload: Option<Value>) {
        self.pending.push((event_type.to_string(), properties));
    }

    fn flush(&mut self) {
        self.flushed.lock().unwrap().append(&mut self.pending);
    }
}

pub fn event_types(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
}

pub fn last_event(log: &EventLog, event_type: &str) -> Option<Value> {
    log.lock()
        .unwrap()
        .iter()
        .rev()
        .find(|(t, _)| t == event_type)
        .map(|(_, p)| p.clone())
}

pub struct FailingSummarizer;

impl Summarizer for FailingSummarizer {
    fn summarize(
        &self,
        _messages: &[Message],
        _max_tokens: usize,
        _policy: &CompactPolicy,
    ) -> Result<String, SummarizationError> {
        Err(SummarizationError::Request("model unavailable".to_string()))
    }
}

/// Returns a one-line summary naming how many messages it saw
pub struct CountingSummarizer;

impl Summarizer for CountingSummarizer {
    fn summarize(
        &self,
        messages: &[Message],
        _max_tokens: usize,
        _policy: &CompactPolicy,
    ) -> Result<String, SummarizationError> {
        Ok(format!("{} earlier messages", messages.len()))
    }
}

pub fn sample_config(
    max_context_tokens: usize,
    keep_recent_turns: usize,
    keep_tool_io_pairs: usize,
) -> CompactConfig {
    ConfigSettings {
        max_context_tokens,
        policy: PolicySettings {
            keep_recent_turns,
            keep_tool_io_pairs,
            ..Default::default()
        },
        ..Default::default()
    }
    .build()
    .unwrap()
}

/// One system message followed by `turns` user/assistant pairs
pub fn sample_conversation(turns: usize) -> Vec<Message> {
    let mut msgs = vec![Message::system("You are a careful coding assistant")];
    for i in 0..turns {
        msgs.push(Message::user(format!("Step {i}: please continue")));
        msgs.push(Message::assistant(format!("Done with step {i}.")));
    }
    msgs
}

/// Manager with a 100-tokens-per-message estimator and a shared event log
pub fn sample_manager(
    config: CompactConfig,
    summarizer: impl Summarizer + 'static,
) -> (CompactManager, EventLog) {
    let (exporter, log) = SharedExporter::new();
    let manager = CompactManager::new(
        config,
        Box::new(FixedEstimator::new(100)),
        Box::new(summarizer),
        Box::new(exporter),
    );
    (manager, log)
}
