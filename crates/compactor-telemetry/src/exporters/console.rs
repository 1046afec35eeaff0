use crate::types::EventRecord;
use compactor_core::Exporter;
use serde_json::Value;
use tracing::info;

/// Writes each event as one structured log line on flush
#[derive(Debug)]
pub struct ConsoleExporter {
    prefix: String,
    pending: Vec<EventRecord>,
}

impl ConsoleExporter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            pending: Vec::new(),
        }
    }

    pub fn pending(&self) -> &[EventRecord] {
        &self.pending
    }
}

impl Default for ConsoleExporter {
    fn default() -> Self {
        Self::new("[Compaction]")
    }
}

impl Exporter for ConsoleExporter {
    fn emit_event(&mut self, event_type: &str, properties: Value, payload: Option<Value>) {
        self.pending
            .push(EventRecord::new(event_type, properties, payload));
    }

    fn flush(&mut self) {
        for event in self.pending.drain(..) {
            let body = serde_json::to_string(&event).unwrap_or_default();
            info!(event = %event.event_type, "{} {}", self.prefix, body);
        }
    }
}
