//! Exported event records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A compaction event as written to logs and JSONL files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "type")]
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub properties: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl EventRecord {
    pub fn new(event_type: &str, properties: Value, payload: Option<Value>) -> Self {
        Self {
            event_type: event_type.to_string(),
            timestamp: Utc::now(),
            properties,
            payload,
        }
    }

    /// Session id carried in the properties, if any
    pub fn session_id(&self) -> Option<&str> {
        self.properties.get("session_id").and_then(Value::as_str)
    }
}

/// Span-shaped event for trace viewers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub trace_id: String,
    pub span_id: String,
    pub name: String,
    /// Seconds since the Unix epoch
    pub timestamp: f64,
    pub properties: Value,
    /// Payload serialized to a JSON string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}
