use crate::types::SpanEvent;
use compactor_core::Exporter;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_EXPORT_URL: &str = "http://localhost:5175/ingest";

pub const EXPORT_TIMEOUT: Duration = Duration::from_secs(2);

/// Events held for redelivery while the endpoint is unreachable
pub const MAX_PENDING_EVENTS: usize = 1_000;

/// Batches span events under one trace id and POSTs them on flush
///
/// Failed deliveries keep the batch for the next flush, up to a cap past
/// which the oldest events are dropped.
pub struct HttpExporter {
    url: String,
    trace_id: String,
    client: reqwest::blocking::Client,
    pending: Vec<SpanEvent>,
    max_pending: usize,
}

impl HttpExporter {
    pub fn new(url: impl Into<String>) -> reqwest::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(EXPORT_TIMEOUT)
            .build()?;
        Ok(Self::with_client(url, client))
    }

    pub fn with_client(url: impl Into<String>, client: reqwest::blocking::Client) -> Self {
        Self {
            url: url.into(),
            trace_id: format!("session-{}", short_id(12)),
            client,
            pending: Vec::new(),
            max_pending: MAX_PENDING_EVENTS,
        }
    }

    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = trace_id.into();
        self
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn pending(&self) -> &[SpanEvent] {
        &self.pending
    }

    fn drop_overflow(&mut self) {
        let overflow = self.pending.len().saturating_sub(self.max_pending);
        if overflow > 0 {
            self.pending.drain(..overflow);
            warn!(dropped = overflow, url = %self.url, "export backlog full, dropped oldest events");
        }
    }

    fn send(&self) -> reqwest::Result<()> {
        self.client
            .post(&self.url)
            .json(&json!({ "events": self.pending }))
            .send()?
            .error_for_status()?;
        Ok(())
    }
}

fn short_id(len: usize) -> String {
    uuid::Uuid::new_v4().simple().to_string()[..len].to_string()
}

fn unix_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

impl Exporter for HttpExporter {
    fn emit_event(&mut self, event_type: &str, properties: Value, payload: Option<Value>) {
        self.pending.push(SpanEvent {
            kind: "span".to_string(),
            trace_id: self.trace_id.clone(),
            span_id: format!("compact-{}", short_id(8)),
            name: event_type.to_string(),
            timestamp: unix_seconds(),
            properties,
            payload: payload.map(|p| p.to_string()),
        });
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        match self.send() {
            Ok(()) => {
                debug!(count = self.pending.len(), url = %self.url, "exported events");
                self.pending.clear();
            }
            Err(e) => {
                warn!(url = %self.url, error = %e, "failed to export events");
                self.drop_overflow();
            }
        }
    }
}
