use crate::io::append_jsonl;
use crate::types::EventRecord;
use compactor_core::Exporter;
use serde_json::Value;
use std::path::PathBuf;
use tracing::warn;

/// Appends events to a JSONL file on flush
#[derive(Debug)]
pub struct JsonlExporter {
    path: PathBuf,
    pending: Vec<EventRecord>,
}

impl JsonlExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pending: Vec::new(),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn pending(&self) -> &[EventRecord] {
        &self.pending
    }
}

impl Exporter for JsonlExporter {
    fn emit_event(&mut self, event_type: &str, properties: Value, payload: Option<Value>) {
        self.pending
            .push(EventRecord::new(event_type, properties, payload));
    }

    fn flush(&mut self) {
        let mut written = 0;
        for event in &self.pending {
            if let Err(e) = append_jsonl(&self.path, event) {
                warn!(path = %self.path.display(), error = %e, "failed to export events");
                break;
            }
            written += 1;
        }
        self.pending.drain(..written);
    }
}
